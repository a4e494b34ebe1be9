//! `bin-years` subcommand

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{PipelineConfig, TemporalConfig};
use crate::pipeline::{
    load_dataset, process_year_of_loss, save_dataset, YEAR_BIN_COLUMN, ZIP_YEAR_BIN_COLUMN,
};
use crate::utils::{create_spinner, finish_with_success, print_info};

/// Bin the year column of `input` and write the result to `output`
pub fn run_bin_years(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    infer_schema_length: usize,
) -> Result<usize> {
    let temporal = match config {
        Some(path) => {
            PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
                .temporal
        }
        None => TemporalConfig::default(),
    };

    let spinner = create_spinner("Loading dataset...");
    let df = load_dataset(input, infer_schema_length)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
    finish_with_success(&spinner, &format!("Loaded {} rows", df.height()));

    let before = df.height();
    let mut binned = process_year_of_loss(&df, &temporal.year_scheme, &temporal.custom_scheme)?;
    print_info(&format!(
        "Added '{}' and '{}'; {} duplicate row(s) removed",
        YEAR_BIN_COLUMN,
        ZIP_YEAR_BIN_COLUMN,
        before - binned.height()
    ));

    save_dataset(&mut binned, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(binned.height())
}
