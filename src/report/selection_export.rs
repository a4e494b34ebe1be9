//! JSON export of feature selection scores

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{CandidateScore, SelectionOutcome};

/// Metadata about the selection run
#[derive(Serialize)]
pub struct SelectionMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub geoprep_version: String,
    pub base_file: String,
    pub candidate_file: String,
    pub target_column: String,
    /// Estimator strategy (`rf` or `ada`)
    pub strategy: String,
    pub folds: usize,
    /// Rows scored after sampling
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_seed: Option<u64>,
}

/// Complete selection export
#[derive(Serialize)]
pub struct SelectionExport<'a> {
    pub metadata: SelectionMetadata,
    pub best_column: &'a str,
    pub best_error: f64,
    /// Candidates in evaluation order
    pub candidates: &'a [CandidateScore],
}

/// Parameters describing the run, for the metadata block
pub struct SelectionExportParams<'a> {
    pub base_file: &'a str,
    pub candidate_file: &'a str,
    pub target_column: &'a str,
    pub strategy: &'a str,
    pub folds: usize,
    pub rows: usize,
    pub sample_seed: Option<u64>,
}

/// Write the selection outcome as pretty-printed JSON
pub fn export_selection(
    outcome: &SelectionOutcome,
    output_path: &Path,
    params: &SelectionExportParams,
) -> Result<()> {
    let export = SelectionExport {
        metadata: SelectionMetadata {
            timestamp: Utc::now().to_rfc3339(),
            geoprep_version: env!("CARGO_PKG_VERSION").to_string(),
            base_file: params.base_file.to_string(),
            candidate_file: params.candidate_file.to_string(),
            target_column: params.target_column.to_string(),
            strategy: params.strategy.to_string(),
            folds: params.folds,
            rows: params.rows,
            sample_seed: params.sample_seed,
        },
        best_column: &outcome.best_column,
        best_error: outcome.best_error,
        candidates: &outcome.scores,
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize selection results to JSON")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write selection export: {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_selection_writes_scores_in_order() {
        let outcome = SelectionOutcome {
            best_column: "b".to_string(),
            best_error: 0.1,
            scores: vec![
                CandidateScore {
                    column: "a".to_string(),
                    error: 0.9,
                    fold_errors: vec![0.8, 1.0],
                },
                CandidateScore {
                    column: "b".to_string(),
                    error: 0.1,
                    fold_errors: vec![0.1, 0.1],
                },
            ],
        };
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("selection.json");
        let params = SelectionExportParams {
            base_file: "base.csv",
            candidate_file: "pcs.csv",
            target_column: "loss",
            strategy: "rf",
            folds: 2,
            rows: 100,
            sample_seed: None,
        };

        export_selection(&outcome, &path, &params).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["best_column"], "b");
        assert_eq!(value["candidates"][0]["column"], "a");
        assert_eq!(value["metadata"]["strategy"], "rf");
        assert!(value["metadata"].get("sample_seed").is_none());
    }
}
