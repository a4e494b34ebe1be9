//! `select` subcommand: prepare the base table and score candidate features

use std::path::PathBuf;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::config::{PipelineConfig, SelectionConfig};
use crate::pipeline::estimator::DEFAULT_FOLDS;
use crate::pipeline::{
    column_names, drop_columns, load_dataset, sample_dataframe, scale_variables,
    select_best_feature, target_values, SelectionOutcome, SelectionStrategy, DEFAULT_SAMPLE_SEED,
};
use crate::report::{export_selection, SelectionExportParams, SelectionReport};
use crate::utils::{create_spinner, finish_with_success, print_info, print_step_header};

/// Options collected from the command line
#[derive(Debug, Clone)]
pub struct SelectOptions {
    pub input: PathBuf,
    pub candidates: PathBuf,
    pub target: String,
    pub strategy: Option<SelectionStrategy>,
    pub scale: bool,
    pub drop_columns: Vec<String>,
    pub sample_size: Option<usize>,
    pub seed: Option<u64>,
    pub export: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub infer_schema_length: usize,
}

/// File values first, then command-line overrides
pub fn resolve_selection_config(options: &SelectOptions) -> Result<SelectionConfig> {
    let mut config = match &options.config {
        Some(path) => {
            PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
                .selection
        }
        None => SelectionConfig::default(),
    };

    if let Some(strategy) = options.strategy {
        config.strategy = strategy;
    }
    config.scale |= options.scale;
    if !options.drop_columns.is_empty() {
        config.drop_columns = options.drop_columns.clone();
    }
    if options.sample_size.is_some() {
        config.sample_size = options.sample_size;
    }
    if options.seed.is_some() {
        config.seed = options.seed;
    }

    Ok(config)
}

/// Sample base and candidate rows together so they stay aligned
fn sample_aligned(
    base: &DataFrame,
    candidates: &DataFrame,
    config: &SelectionConfig,
) -> Result<(DataFrame, DataFrame)> {
    let Some(sample_size) = config.sample_size else {
        return Ok((base.clone(), candidates.clone()));
    };

    let base_names = column_names(base);
    let candidate_names = column_names(candidates);
    if let Some(clash) = candidate_names.iter().find(|c| base_names.contains(c)) {
        anyhow::bail!(
            "Candidate column '{}' also exists in the base table; rename it before sampling",
            clash
        );
    }

    let mut combined = base.clone();
    combined.hstack_mut(candidates.get_columns())?;
    let sampled = sample_dataframe(&combined, sample_size, true, config.seed)?;

    Ok((
        sampled.select(base_names.iter().map(|c| c.as_str()))?,
        sampled.select(candidate_names.iter().map(|c| c.as_str()))?,
    ))
}

/// Seed actually used for row sampling, `None` when every row was kept
fn effective_sample_seed(config: &SelectionConfig, n_rows: usize) -> Option<u64> {
    match config.sample_size {
        Some(size) if size < n_rows => Some(config.seed.unwrap_or(DEFAULT_SAMPLE_SEED)),
        _ => None,
    }
}

pub fn run_select(options: &SelectOptions) -> Result<SelectionOutcome> {
    let config = resolve_selection_config(options)?;

    print_step_header(1, "Load Tables");
    let spinner = create_spinner("Loading base and candidate tables...");
    let mut base = load_dataset(&options.input, options.infer_schema_length)
        .with_context(|| format!("Failed to load dataset: {}", options.input.display()))?;
    let candidates = load_dataset(&options.candidates, options.infer_schema_length)
        .with_context(|| format!("Failed to load candidates: {}", options.candidates.display()))?;
    finish_with_success(
        &spinner,
        &format!(
            "Loaded {} rows, {} base column(s), {} candidate(s)",
            base.height(),
            base.width(),
            candidates.width()
        ),
    );

    print_step_header(2, "Prepare Base Features");
    if !config.drop_columns.is_empty() {
        base = drop_columns(&base, &config.drop_columns)?;
        print_info(&format!("Dropped {} column(s)", config.drop_columns.len()));
    }
    let sample_seed = effective_sample_seed(&config, base.height());
    let (base, candidates) = sample_aligned(&base, &candidates, &config)?;
    let base = scale_variables(&base, &options.target, config.scale)?;

    let target = target_values(&base, &options.target)?;
    let features = drop_columns(&base, &[options.target.as_str()])?;
    print_info(&format!(
        "{} row(s), {} base feature(s)",
        features.height(),
        features.width()
    ));

    print_step_header(3, "Score Candidates");
    let outcome = select_best_feature(&features, &candidates, &target, config.strategy)?;

    SelectionReport::new(config.strategy.to_string(), &outcome).display();

    if let Some(path) = &options.export {
        let base_file = options.input.display().to_string();
        let candidate_file = options.candidates.display().to_string();
        let strategy = config.strategy.to_string();
        export_selection(
            &outcome,
            path,
            &SelectionExportParams {
                base_file: &base_file,
                candidate_file: &candidate_file,
                target_column: &options.target,
                strategy: &strategy,
                folds: DEFAULT_FOLDS,
                rows: features.height(),
                sample_seed,
            },
        )?;
        print_info(&format!("Scores exported to {}", path.display()));
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_aligned_keeps_rows_together() {
        let base = df! { "id" => (0..50i64).collect::<Vec<_>>() }.unwrap();
        let candidates = df! { "pc" => (0..50i64).map(|v| v * 10).collect::<Vec<_>>() }.unwrap();
        let config = SelectionConfig {
            sample_size: Some(10),
            seed: Some(3),
            ..Default::default()
        };

        let (b, c) = sample_aligned(&base, &candidates, &config).unwrap();
        assert_eq!(b.height(), 10);
        let ids = b.column("id").unwrap().i64().unwrap();
        let pcs = c.column("pc").unwrap().i64().unwrap();
        for (id, pc) in ids.into_no_null_iter().zip(pcs.into_no_null_iter()) {
            assert_eq!(pc, id * 10);
        }
    }

    #[test]
    fn test_sample_aligned_rejects_name_clash() {
        let base = df! { "x" => [1i64, 2] }.unwrap();
        let config = SelectionConfig {
            sample_size: Some(1),
            ..Default::default()
        };
        assert!(sample_aligned(&base, &base, &config).is_err());
    }

    #[test]
    fn test_effective_sample_seed_reports_default() {
        let config = SelectionConfig {
            sample_size: Some(10),
            ..Default::default()
        };
        assert_eq!(effective_sample_seed(&config, 50), Some(DEFAULT_SAMPLE_SEED));
        assert_eq!(effective_sample_seed(&config, 10), None, "No sampling when every row fits");

        let config = SelectionConfig {
            sample_size: Some(10),
            seed: Some(7),
            ..Default::default()
        };
        assert_eq!(effective_sample_seed(&config, 50), Some(7));
        assert_eq!(effective_sample_seed(&SelectionConfig::default(), 50), None);
    }

    #[test]
    fn test_flags_override_config() {
        let options = SelectOptions {
            input: PathBuf::from("base.csv"),
            candidates: PathBuf::from("pcs.csv"),
            target: "loss".to_string(),
            strategy: Some(SelectionStrategy::AdaBoost),
            scale: true,
            drop_columns: vec!["id".to_string()],
            sample_size: None,
            seed: Some(9),
            export: None,
            config: None,
            infer_schema_length: 100,
        };
        let config = resolve_selection_config(&options).unwrap();
        assert_eq!(config.strategy, SelectionStrategy::AdaBoost);
        assert!(config.scale);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.drop_columns, vec!["id".to_string()]);
    }
}
