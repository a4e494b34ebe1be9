//! Dataset loader and writer for CSV and Parquet files

use polars::prelude::*;
use std::path::Path;

use crate::error::{PrepError, Result};

/// Rows used for CSV schema inference when the caller has no preference
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// On-disk table formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Detect the format from a file name. `.parquet.gzip` is Parquet with
    /// gzip-compressed pages, the layout the geometry partitions ship in.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();

        if name.ends_with(".parquet") || name.ends_with(".parquet.gzip") {
            Ok(FileFormat::Parquet)
        } else if name.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else {
            Err(PrepError::Configuration(format!(
                "Unsupported file format: {}. Supported formats: csv, parquet, parquet.gzip",
                path.display()
            )))
        }
    }
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let lf = match FileFormat::from_path(path)? {
        FileFormat::Csv => {
            // 0 means full table scan
            let schema_length = if infer_schema_length == 0 {
                None
            } else {
                Some(infer_schema_length)
            };
            LazyCsvReader::new(path)
                .with_infer_schema_length(schema_length)
                .finish()?
        }
        FileFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())?,
    };

    Ok(lf.collect()?)
}

/// Save dataset to file (CSV or Parquet based on extension)
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => {
            let mut file = std::fs::File::create(path)?;
            CsvWriter::new(&mut file).finish(df)?;
        }
        FileFormat::Parquet => {
            let file = std::fs::File::create(path)?;
            ParquetWriter::new(file)
                .with_compression(parquet_compression(path))
                .finish(df)?;
        }
    }

    Ok(())
}

/// Gzip pages for `.parquet.gzip`, the writer default otherwise
fn parquet_compression(path: &Path) -> ParquetCompression {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    if name.ends_with(".gzip") {
        ParquetCompression::Gzip(None)
    } else {
        ParquetCompression::default()
    }
}

/// Column names of a loaded frame, as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Fail with `MissingColumn` unless every name is present in `df`
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<()> {
    let available = column_names(df);
    for name in names {
        let name = name.as_ref();
        if !available.iter().any(|c| c == name) {
            return Err(PrepError::missing_column(name, available));
        }
    }
    Ok(())
}
