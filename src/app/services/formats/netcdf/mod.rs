//! netCDF members (`*_hy1.nc`, `*_ctd.nc`) of bottle and CTD archives

use super::{CodecContext, Encoding, FileCodec, FileKind};
use crate::Result;
use crate::app::models::DataFile;
use tracing::debug;

pub mod classic;
pub mod mapping;

pub use classic::{NcAttribute, NcDimension, NcFile, NcValues, NcVariable};

/// Codec for one netCDF classic member file
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfCodec;

impl FileCodec for NetCdfCodec {
    fn encoding(&self) -> Encoding {
        Encoding::NetCdf
    }

    fn read_file(&self, ctx: &CodecContext, kind: FileKind, bytes: &[u8]) -> Result<DataFile> {
        if kind == FileKind::Summary {
            return Err(self.unsupported(kind, "read"));
        }
        let nc = NcFile::decode(bytes)?;
        let file = mapping::from_netcdf(ctx, kind, &nc)?;
        debug!(
            "Read netCDF {} member: {} variables, {} columns",
            kind,
            nc.variables.len(),
            file.column_count()
        );
        Ok(file)
    }

    fn write_file(&self, ctx: &CodecContext, kind: FileKind, file: &DataFile) -> Result<Vec<u8>> {
        if kind == FileKind::Summary {
            return Err(self.unsupported(kind, "write"));
        }
        mapping::to_netcdf(ctx, kind, file)?.encode()
    }
}
