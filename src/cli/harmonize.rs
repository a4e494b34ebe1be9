//! `harmonize` subcommand: load every requested unit and write one table each

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::pipeline::{
    harmonize_units, save_dataset, FileBoundaryProvider, GeoUnit, HarmonizerConfig,
    PartitionSource,
};
use crate::report::HarmonizeSummary;
use crate::utils::{print_count, print_info, print_step_header, print_success};

/// Options collected from the command line
#[derive(Debug, Clone)]
pub struct HarmonizeOptions {
    pub base_path: Option<String>,
    pub units: Vec<GeoUnit>,
    pub output_dir: PathBuf,
    pub format: Option<String>,
    pub discover: bool,
    pub output_format: String,
    pub config: Option<PathBuf>,
}

/// Merge the config file (if any) with command-line overrides
pub fn resolve_harmonizer_config(options: &HarmonizeOptions) -> Result<HarmonizerConfig> {
    let from_file = match &options.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?
            .harmonizer,
        None => None,
    };

    let mut config = match (from_file, &options.base_path) {
        (Some(mut config), base_path) => {
            if let Some(base_path) = base_path {
                config.base_path = base_path.clone();
            }
            config
        }
        (None, Some(base_path)) => HarmonizerConfig::new(base_path.clone(), Vec::new()),
        (None, None) => anyhow::bail!(
            "No geometry source location. Use --base-path or a config file with a 'harmonizer' section."
        ),
    };

    if !options.units.is_empty() {
        config.units = options.units.clone();
    }
    if config.units.is_empty() {
        anyhow::bail!("No units requested. Use --units, e.g. --units state,county,zipcode");
    }
    if let Some(format) = &options.format {
        config.format = format.clone();
    }
    if options.discover {
        for unit in [GeoUnit::Tract, GeoUnit::BlockGroup, GeoUnit::Zipcode] {
            config.partitions.insert(unit, PartitionSource::Discover);
        }
    }

    Ok(config)
}

/// Output file of one unit: `{output_dir}/{unit}_harmonized.{format}`
pub fn unit_output_path(output_dir: &Path, unit: GeoUnit, output_format: &str) -> PathBuf {
    output_dir.join(format!("{}_harmonized.{}", unit.name(), output_format))
}

pub fn run_harmonize(options: &HarmonizeOptions) -> Result<HarmonizeSummary> {
    let config = resolve_harmonizer_config(options)?;
    let boundaries = FileBoundaryProvider::from_layout(&config.layout());

    print_step_header(1, "Load Geometry Sources");
    let step_start = Instant::now();
    print_count("unit(s) requested", config.units.len());
    let tables = harmonize_units(&config, &boundaries)?;
    print_success(&format!(
        "Harmonized {} unit(s) in {:.1}s",
        tables.len(),
        step_start.elapsed().as_secs_f64()
    ));

    print_step_header(2, "Write Unit Tables");
    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!("Failed to create output directory: {}", options.output_dir.display())
    })?;

    let mut summary = HarmonizeSummary::new();
    for (unit, table) in tables {
        let path = unit_output_path(&options.output_dir, unit, &options.output_format);
        let mut frame = table.frame.clone();
        save_dataset(&mut frame, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        print_info(&format!("{} → {}", unit, path.display()));
        summary.add_unit(&table);
    }

    Ok(summary)
}
