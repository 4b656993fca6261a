//! WOCE fixed-width text
//!
//! Bottle files, CTD casts and cruise summaries share the fixed-width
//! conventions; bottle and CTD files also share the parameter block in
//! [`columnar`].

use super::primitives::{fill_token, format_value};
use super::{CodecContext, Encoding, FileCodec, FileKind};
use crate::app::models::DataFile;
use crate::{Error, Result};

pub mod bottle;
pub mod columnar;
pub mod ctd;
pub mod summary;

/// WOCE text codec, dispatching on the file kind
#[derive(Debug, Clone, Copy, Default)]
pub struct WoceCodec;

impl FileCodec for WoceCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Woce
    }

    fn read_file(&self, ctx: &CodecContext, kind: FileKind, bytes: &[u8]) -> Result<DataFile> {
        match kind {
            FileKind::Bottle => bottle::read(ctx, bytes),
            FileKind::Ctd => ctd::read(ctx, bytes),
            FileKind::Summary => summary::read(ctx, bytes),
        }
    }

    fn write_file(&self, ctx: &CodecContext, kind: FileKind, file: &DataFile) -> Result<Vec<u8>> {
        match kind {
            FileKind::Bottle => bottle::write(ctx, file),
            FileKind::Ctd => ctd::write(ctx, file),
            FileKind::Summary => summary::write(ctx, file),
        }
    }
}

/// Text for a single-valued header record, from a global or a constant column
///
/// Absent values are written as the fill token.
fn record_token(ctx: &CodecContext, file: &DataFile, name: &str) -> Result<String> {
    let value = match (file.global(name), file.column(name)) {
        (Some(global), _) => global.value.clone(),
        (None, Some(column)) if column.is_global() => column.get(0).cloned(),
        (None, Some(_)) => {
            return Err(Error::not_supported(format!(
                "WOCE header record with more than one {}",
                name
            )));
        }
        (None, None) => None,
    };
    let parameter = ctx.registry.lookup(name)?;
    Ok(match value {
        Some(value) => format_value(&parameter, Some(&value)),
        None => fill_token(&parameter),
    })
}
