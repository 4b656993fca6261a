//! Data models for cruise data
//!
//! The canonical in-memory representation shared by every codec: values,
//! flagged columns, data files and collections of casts.

pub mod collection;
pub mod column;
pub mod datafile;
pub mod value;

pub use collection::{ColumnLayout, DataFileCollection, MemberLayout, cast_member_stem};
pub use column::Column;
pub use datafile::{DataFile, ExportSeries, GlobalValue};
pub use value::Value;
