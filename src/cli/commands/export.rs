//! Export command: flatten a data file into a Parquet, CSV or JSON table

use crate::app::services::formats::open_path;
use crate::cli::args::{Compression, ExportArgs, ExportFormat};
use crate::cli::commands::shared::{RunStats, prepare_context, setup_logging};
use crate::{DataFile, Error, Result};
use colored::*;
use polars::prelude::{CsvWriter, ParquetWriter as PolarsParquetWriter, SerWriter, StatisticsOptions};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Run the export command
pub async fn run_export(args: &ExportArgs) -> Result<RunStats> {
    setup_logging(&args.common)?;
    args.validate()?;
    let format = args.resolved_format()?;
    let ctx = prepare_context(&args.common)?;
    let start = Instant::now();

    let (source, dataset) = open_path(&ctx, &args.input)?;
    info!(
        "Exporting {} ({}) as {:?}",
        args.input.display(),
        source,
        format
    );
    let file = dataset.into_datafile();

    let mut stats = RunStats {
        files_read: 1,
        rows: file.length()?,
        ..Default::default()
    };

    write_table(&file, &args.output, format, args.compression)?;
    stats.record_output(&args.output);
    stats.processing_time = start.elapsed();

    if args.common.show_progress() {
        println!(
            "{} {} rows to {} ({})",
            "Exported".bright_green(),
            stats.rows,
            args.output.display(),
            RunStats::format_size(stats.total_output_size())
        );
    }

    Ok(stats)
}

/// Write the flattened view of `file` to `output`
pub fn write_table(
    file: &DataFile,
    output: &Path,
    format: ExportFormat,
    compression: Compression,
) -> Result<()> {
    let create = || {
        std::fs::File::create(output).map_err(|e| {
            Error::io(format!("Failed to create output file: {}", output.display()), e)
        })
    };

    match format {
        ExportFormat::Parquet => {
            let mut frame = file.to_dataframe()?;
            debug!("Writing {} x {} frame to parquet", frame.height(), frame.width());
            PolarsParquetWriter::new(create()?)
                .with_compression(compression.to_polars_compression())
                .with_statistics(StatisticsOptions::full())
                .finish(&mut frame)?;
        }
        ExportFormat::Csv => {
            let mut frame = file.to_dataframe()?;
            CsvWriter::new(create()?)
                .include_header(true)
                .finish(&mut frame)?;
        }
        ExportFormat::Json => {
            let hash = file.to_hash();
            serde_json::to_writer_pretty(create()?, &hash).map_err(|e| {
                Error::configuration(format!("Failed to serialize {}: {}", output.display(), e))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::formats::{CodecContext, ExchangeCodec, FileCodec, FileKind};
    use polars::prelude::{ParquetReader, SerReader};
    use tempfile::TempDir;

    const BOTTLE: &str = "BOTTLE,20080101SIOCCHDOJFS\n\
EXPOCODE,SECT_ID,STNNBR,CASTNO,SAMPNO,CTDPRS,SALNTY,SALNTY_FLAG_W\n\
,,,,,DBAR,PSS-78,\n\
33RR20070322,I8S,1,1,1,2.0,34.5412,2\n\
33RR20070322,I8S,1,1,2,100.0,-999.0000,9\n\
END_DATA\n";

    fn bottle() -> DataFile {
        ExchangeCodec
            .read_file(&CodecContext::default(), FileKind::Bottle, BOTTLE.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_parquet_export() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("bottle.parquet");
        write_table(&bottle(), &output, ExportFormat::Parquet, Compression::Snappy).unwrap();

        let frame = ParquetReader::new(std::fs::File::open(&output).unwrap())
            .finish()
            .unwrap();
        assert_eq!(frame.height(), 2);
        assert!(frame.column("SALNTY").is_ok());
        assert!(frame.column("SALNTY_FLAG_W").is_ok());
    }

    #[test]
    fn test_json_export() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("bottle.json");
        write_table(&bottle(), &output, ExportFormat::Json, Compression::Snappy).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["SALNTY_FLAG_W"], serde_json::json!([2, 9]));
        assert_eq!(json["SALNTY"][1], serde_json::Value::Null);
    }

    #[test]
    fn test_csv_export() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("bottle.csv");
        write_table(&bottle(), &output, ExportFormat::Csv, Compression::Snappy).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().contains("SALNTY_FLAG_W"));
    }
}
