//! Zip archives of cruise members
//!
//! Members are read sequentially in archive order: each entry is copied into
//! an owned buffer, parsed by the member codec and merged before the next is
//! opened. Writing is deterministic so that an archive written twice from the
//! same collection is byte-identical.

use super::{CodecContext, Encoding, FileKind, codec_for};
use crate::app::models::collection::identity_token;
use crate::app::models::{DataFile, DataFileCollection, cast_member_stem};
use crate::constants::{
    MEMBER_SUFFIX_BOTTLE_NETCDF, MEMBER_SUFFIX_CTD_EXCHANGE, MEMBER_SUFFIX_CTD_NETCDF,
    MEMBER_SUFFIX_CTD_WOCE, params,
};
use crate::{Error, Result};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Upper bound on the buffer reserved from a member's declared size
const MAX_MEMBER_PREALLOCATION: u64 = 1 << 20;

/// Whether an archive entry is a data member for `encoding`
pub fn accepts_member(encoding: Encoding, name: &str) -> bool {
    if name.ends_with('/') {
        return false;
    }
    let base = name.rsplit('/').next().unwrap_or(name);
    match encoding {
        Encoding::Exchange => base.contains(".csv"),
        Encoding::Woce => {
            let upper = base.to_ascii_uppercase();
            !upper.contains("README") && !upper.contains("DOC")
        }
        Encoding::NetCdf => base.ends_with(".nc"),
    }
}

/// Member file suffix written for `kind` in `encoding`
pub fn member_suffix(kind: FileKind, encoding: Encoding) -> Result<&'static str> {
    match (kind, encoding) {
        (FileKind::Ctd, Encoding::Exchange) => Ok(MEMBER_SUFFIX_CTD_EXCHANGE),
        (FileKind::Ctd, Encoding::Woce) => Ok(MEMBER_SUFFIX_CTD_WOCE),
        (FileKind::Ctd, Encoding::NetCdf) => Ok(MEMBER_SUFFIX_CTD_NETCDF),
        (FileKind::Bottle, Encoding::NetCdf) => Ok(MEMBER_SUFFIX_BOTTLE_NETCDF),
        (kind, encoding) => Err(Error::not_supported(format!(
            "zip archive of {} {} files",
            encoding, kind
        ))),
    }
}

pub fn read_collection(
    ctx: &CodecContext,
    kind: FileKind,
    encoding: Encoding,
    bytes: &[u8],
) -> Result<DataFileCollection> {
    let codec = codec_for(encoding);
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut collection = DataFileCollection::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if entry.is_dir() || !accepts_member(encoding, &name) {
            debug!("Skipping archive entry {}", name);
            continue;
        }

        let mut buffer = Vec::with_capacity(member_capacity(entry.size()));
        entry
            .read_to_end(&mut buffer)
            .map_err(|e| Error::member(&name, Error::io(format!("reading {}", name), e)))?;
        drop(entry);

        let file = codec
            .read_file(ctx, kind, &buffer)
            .map_err(|e| Error::member(&name, e))?;
        collection
            .merge(name.clone(), file)
            .map_err(|e| Error::member(&name, e))?;
    }

    info!(
        "Read {} {} members from archive",
        collection.len(),
        encoding
    );
    Ok(collection)
}

pub fn write_collection(
    ctx: &CodecContext,
    kind: FileKind,
    encoding: Encoding,
    collection: &DataFileCollection,
) -> Result<Vec<u8>> {
    let codec = codec_for(encoding);
    let suffix = member_suffix(kind, encoding)?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut used = HashSet::new();

    for (name, member) in collection.split() {
        let member_name = member_name(&name, &member, suffix);
        if !used.insert(member_name.clone()) {
            return Err(Error::merge_conflict(format!(
                "two members would be written as {}",
                member_name
            )));
        }
        let bytes = codec
            .write_file(ctx, kind, &member)
            .map_err(|e| Error::member(&member_name, e))?;
        writer.start_file(member_name.as_str(), options)?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::io(format!("writing {}", member_name), e))?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Initial buffer size for a member; the declared size is untrusted
fn member_capacity(declared: u64) -> usize {
    declared.min(MAX_MEMBER_PREALLOCATION) as usize
}

/// Keep a name that already has the target suffix, otherwise derive one from the cast
fn member_name(name: &str, member: &DataFile, suffix: &str) -> String {
    if name.ends_with(suffix) {
        return name.to_string();
    }
    let stem = cast_member_stem(
        &identity_token(member.value_at(params::EXPOCODE, 0)),
        &identity_token(member.value_at(params::STNNBR, 0)),
        &identity_token(member.value_at(params::CASTNO, 0)),
    );
    format!("{}{}", stem, suffix)
}
