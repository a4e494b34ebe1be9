//! JSON pipeline configuration
//!
//! Every section is optional; missing sections and fields fall back to the
//! defaults of the corresponding pipeline step. Command-line flags override
//! file values.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PrepError, Result};
use crate::pipeline::{BinScheme, HarmonizerConfig, SelectionStrategy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub harmonizer: Option<HarmonizerConfig>,
    #[serde(default)]
    pub temporal: TemporalConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

/// The two bucket schemes applied to the year of loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalConfig {
    #[serde(default)]
    pub year_scheme: BinScheme,
    #[serde(default = "default_custom_scheme")]
    pub custom_scheme: BinScheme,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            year_scheme: BinScheme::default(),
            custom_scheme: default_custom_scheme(),
        }
    }
}

/// Before and from the 2011 zipcode vintage
fn default_custom_scheme() -> BinScheme {
    BinScheme::new(vec![1980.0, 2011.0, 2025.0], vec![0, 1]).with_include_lowest(true)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub strategy: SelectionStrategy,
    /// Standardize continuous base features before scoring
    #[serde(default)]
    pub scale: bool,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    /// Rows to sample before scoring; `None` scores every row
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| PrepError::Configuration(format!("Invalid pipeline config: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{GeoUnit, PartitionSource};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert!(config.harmonizer.is_none());
        assert_eq!(config.temporal, TemporalConfig::default());
        assert_eq!(config.selection.strategy, SelectionStrategy::RandomForest);
        config.temporal.custom_scheme.validate("custom").unwrap();
    }

    #[test]
    fn test_full_config_parses() {
        let json = r#"{
            "harmonizer": {
                "base_path": "geo/",
                "units": ["state", "County", "zipcode"],
                "format": "csv",
                "partitions": { "zipcode": { "kind": "discover" } },
                "cleaning": {
                    "county": { "code_widths": { "GEOID": 5 }, "dedup_columns": ["GEOID"] }
                }
            },
            "temporal": {
                "custom_scheme": { "edges": [1980, 2000, 2022], "labels": [0, 1], "include_lowest": true }
            },
            "selection": { "strategy": "ada", "sample_size": 500, "seed": 7 }
        }"#;

        let config = PipelineConfig::from_json(json).unwrap();
        let harmonizer = config.harmonizer.unwrap();
        assert_eq!(harmonizer.units, vec![GeoUnit::State, GeoUnit::County, GeoUnit::Zipcode]);
        assert_eq!(harmonizer.partition_source(GeoUnit::Zipcode), PartitionSource::Discover);
        assert_eq!(harmonizer.zipcode_union.as_deref(), Some("2011_union"));
        assert_eq!(harmonizer.cleaning[&GeoUnit::County].code_widths["GEOID"], 5);
        assert_eq!(config.temporal.custom_scheme.labels, vec![0, 1]);
        assert_eq!(config.temporal.year_scheme, BinScheme::default());
        assert_eq!(config.selection.strategy, SelectionStrategy::AdaBoost);
        assert_eq!(config.selection.sample_size, Some(500));
    }

    #[test]
    fn test_unknown_unit_is_configuration_error() {
        let json = r#"{ "harmonizer": { "base_path": "", "units": ["galaxy"] } }"#;
        assert!(matches!(
            PipelineConfig::from_json(json),
            Err(PrepError::Configuration(msg)) if msg.contains("galaxy")
        ));
    }
}
