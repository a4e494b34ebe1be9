//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::{GeoUnit, SelectionStrategy};

/// geoprep - Harmonize geographic units, bin loss years and select derived features
#[derive(Parser, Debug)]
#[command(name = "geoprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load per-unit geometry sources and write one harmonized table per unit
    Harmonize {
        /// Prefix of every geometry source, usually a directory ending in '/'
        #[arg(long)]
        base_path: Option<String>,

        /// Units to load (comma-separated): state, county, tract, block_group, zipcode, lat_long
        #[arg(long, value_delimiter = ',', value_parser = parse_unit)]
        units: Vec<GeoUnit>,

        /// Directory the harmonized tables are written to
        #[arg(long)]
        output_dir: PathBuf,

        /// Source file format: parquet.gzip, parquet or csv
        #[arg(long)]
        format: Option<String>,

        /// Find partition files on disk instead of using the default manifests
        #[arg(long, default_value = "false")]
        discover: bool,

        /// Extension of the written tables
        #[arg(long, default_value = "parquet")]
        output_format: String,

        /// JSON pipeline configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Add year-of-loss bucket columns and drop duplicate rows
    BinYears {
        /// Input file path (CSV or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path. Defaults to the input directory with a '_binned' suffix.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON pipeline configuration file with the bin schemes
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only). Use 0 for a full scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },

    /// Score candidate features and report the one that lowers the error most
    Select {
        /// Base feature table (CSV or Parquet); must contain the target column
        #[arg(short, long)]
        input: PathBuf,

        /// Candidate feature table, aligned row-for-row with the input
        #[arg(short, long)]
        candidates: PathBuf,

        /// Target column name in the input table
        #[arg(short, long)]
        target: String,

        /// Estimator used for scoring: rf or ada
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<SelectionStrategy>,

        /// Standardize continuous base features first
        #[arg(long, default_value = "false")]
        scale: bool,

        /// Base columns to drop before scoring (comma-separated)
        #[arg(long, value_delimiter = ',')]
        drop_columns: Vec<String>,

        /// Score a random sample of this many rows
        #[arg(long, value_parser = validate_sample_size)]
        sample_size: Option<usize>,

        /// Seed for row sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Write per-candidate scores to this JSON file
        #[arg(long)]
        export: Option<PathBuf>,

        /// JSON pipeline configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only). Use 0 for a full scan.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

/// Output path next to `input` with `suffix` appended to the stem
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("parquet");
    parent.join(format!("{}_{}.{}", stem, suffix, extension))
}

fn parse_unit(s: &str) -> Result<GeoUnit, String> {
    s.parse().map_err(|e: crate::error::PrepError| e.to_string())
}

fn parse_strategy(s: &str) -> Result<SelectionStrategy, String> {
    s.parse().map_err(|e: crate::error::PrepError| e.to_string())
}

/// Validator for sample_size parameter
fn validate_sample_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid row count", s))?;

    if value == 0 {
        Err("sample_size must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
