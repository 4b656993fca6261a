//! Filename-based format selection and whole-file read/write

use super::zip_collection::{read_collection, write_collection};
use super::{CodecContext, Encoding, FileKind, codec_for};
use crate::app::models::{DataFile, DataFileCollection};
use crate::constants::{
    SUFFIX_BOTTLE_EXCHANGE, SUFFIX_BOTTLE_NETCDF_ZIP, SUFFIX_BOTTLE_WOCE, SUFFIX_CTD_EXCHANGE_ZIP,
    SUFFIX_CTD_NETCDF_ZIP, SUFFIX_CTD_WOCE_ZIP, SUFFIX_SUMMARY_WOCE,
};
use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Every supported on-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    SummaryWoce,
    BottleWoce,
    BottleExchange,
    BottleNetCdfZip,
    CtdWoceZip,
    CtdExchangeZip,
    CtdNetCdfZip,
}

/// Filename suffixes, matched case-sensitively against the end of the name
const SUFFIX_TABLE: [(&str, Format); 7] = [
    (SUFFIX_SUMMARY_WOCE, Format::SummaryWoce),
    (SUFFIX_BOTTLE_WOCE, Format::BottleWoce),
    (SUFFIX_BOTTLE_EXCHANGE, Format::BottleExchange),
    (SUFFIX_BOTTLE_NETCDF_ZIP, Format::BottleNetCdfZip),
    (SUFFIX_CTD_NETCDF_ZIP, Format::CtdNetCdfZip),
    (SUFFIX_CTD_EXCHANGE_ZIP, Format::CtdExchangeZip),
    (SUFFIX_CTD_WOCE_ZIP, Format::CtdWoceZip),
];

impl Format {
    pub fn all() -> impl Iterator<Item = Format> {
        SUFFIX_TABLE.iter().map(|(_, format)| *format)
    }

    pub fn kind(self) -> FileKind {
        match self {
            Format::SummaryWoce => FileKind::Summary,
            Format::BottleWoce | Format::BottleExchange | Format::BottleNetCdfZip => {
                FileKind::Bottle
            }
            Format::CtdWoceZip | Format::CtdExchangeZip | Format::CtdNetCdfZip => FileKind::Ctd,
        }
    }

    pub fn encoding(self) -> Encoding {
        match self {
            Format::SummaryWoce | Format::BottleWoce | Format::CtdWoceZip => Encoding::Woce,
            Format::BottleExchange | Format::CtdExchangeZip => Encoding::Exchange,
            Format::BottleNetCdfZip | Format::CtdNetCdfZip => Encoding::NetCdf,
        }
    }

    /// Whether the format is a zip archive of members
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            Format::BottleNetCdfZip | Format::CtdWoceZip | Format::CtdExchangeZip | Format::CtdNetCdfZip
        )
    }

    pub fn suffix(self) -> &'static str {
        SUFFIX_TABLE
            .iter()
            .find(|(_, format)| *format == self)
            .map(|(suffix, _)| *suffix)
            .unwrap_or_default()
    }

    /// Decode a whole file or archive
    pub fn read(self, ctx: &CodecContext, bytes: &[u8]) -> Result<Dataset> {
        if self.is_collection() {
            read_collection(ctx, self.kind(), self.encoding(), bytes).map(Dataset::Collection)
        } else {
            codec_for(self.encoding())
                .read_file(ctx, self.kind(), bytes)
                .map(Dataset::File)
        }
    }

    /// Encode a dataset in this format
    ///
    /// A collection written to a single-file format is written as its unified
    /// file; a single file written to an archive format is split per cast.
    pub fn write(self, ctx: &CodecContext, dataset: &Dataset) -> Result<Vec<u8>> {
        match (self.is_collection(), dataset) {
            (true, Dataset::Collection(collection)) => {
                write_collection(ctx, self.kind(), self.encoding(), collection)
            }
            (true, Dataset::File(file)) => {
                let collection = DataFileCollection::from_casts(file)?;
                write_collection(ctx, self.kind(), self.encoding(), &collection)
            }
            (false, dataset) => {
                codec_for(self.encoding()).write_file(ctx, self.kind(), dataset.as_datafile())
            }
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let archive = if self.is_collection() { " archive" } else { "" };
        write!(f, "{} {}{} ({})", self.encoding(), self.kind(), archive, self.suffix())
    }
}

/// Result of reading a file: one DataFile or an archive collection
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    File(DataFile),
    Collection(DataFileCollection),
}

impl Dataset {
    /// The single file, or the collection's unified view
    pub fn as_datafile(&self) -> &DataFile {
        match self {
            Dataset::File(file) => file,
            Dataset::Collection(collection) => collection.unified(),
        }
    }

    pub fn into_datafile(self) -> DataFile {
        match self {
            Dataset::File(file) => file,
            Dataset::Collection(collection) => collection.into_unified(),
        }
    }

    /// Member count; a single file counts as one
    pub fn member_count(&self) -> usize {
        match self {
            Dataset::File(_) => 1,
            Dataset::Collection(collection) => collection.len(),
        }
    }
}

/// Pick the format for a filename by its suffix (case-sensitive)
pub fn select_codec(filename: &str) -> Result<Format> {
    SUFFIX_TABLE
        .iter()
        .find(|(suffix, _)| filename.ends_with(suffix))
        .map(|(_, format)| *format)
        .ok_or_else(|| Error::unrecognized_format(filename))
}

/// Read a file from disk using the format its name implies
pub fn open_path(ctx: &CodecContext, path: &Path) -> Result<(Format, Dataset)> {
    if !path.is_file() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = select_codec(&filename)?;

    let bytes = std::fs::read(path)
        .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
    debug!("Opening {} as {}", path.display(), format);
    let dataset = format.read(ctx, &bytes)?;
    Ok((format, dataset))
}

/// Write a dataset to disk in the format `path` implies
pub fn save_path(ctx: &CodecContext, path: &Path, dataset: &Dataset) -> Result<Format> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = select_codec(&filename)?;
    let bytes = format.write(ctx, dataset)?;
    std::fs::write(path, bytes)
        .map_err(|e| Error::io(format!("writing {}", path.display()), e))?;
    Ok(format)
}
