//! Geometry source layout: file naming, partition manifests and discovery

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::unit::GeoUnit;
use crate::error::{PrepError, Result};
use crate::pipeline::loader::{load_dataset, DEFAULT_INFER_SCHEMA_LENGTH};

/// Default on-disk format of geometry sources
pub const DEFAULT_SOURCE_FORMAT: &str = "parquet.gzip";

/// A half-open row range `[start, end)` identifying one partition file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionRange {
    pub start: usize,
    pub end: usize,
}

impl PartitionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Where the rows of one unit come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitionSource {
    /// One unpartitioned file: `{stem}_geometry.<format>`
    Single,
    /// Explicit partition files, read in the listed order
    Manifest { ranges: Vec<PartitionRange> },
    /// List the base directory and read every `{stem}_geometry_<start>_<end>`
    /// file in ascending `start` order
    Discover,
}

impl PartitionSource {
    /// Manifest of consecutive `chunk_size` ranges covering `0..total`
    pub fn chunked(chunk_size: usize, total: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(PrepError::Configuration(
                "Partition chunk size must be positive".to_string(),
            ));
        }
        Ok(PartitionSource::Manifest {
            ranges: chunk_ranges(chunk_size, total),
        })
    }

    /// Layout the geometry exports ship with
    pub fn default_for(unit: GeoUnit) -> Self {
        let (chunk_size, total) = match unit {
            GeoUnit::Zipcode => (50_000, 300_000),
            GeoUnit::BlockGroup => (40_000, 120_000),
            GeoUnit::Tract => (30_000, 60_000),
            GeoUnit::State | GeoUnit::County | GeoUnit::LatLong => return PartitionSource::Single,
        };
        PartitionSource::Manifest {
            ranges: chunk_ranges(chunk_size, total),
        }
    }

    /// Resolve to the ordered list of files to read for `unit`
    pub fn resolve(&self, layout: &SourceLayout, unit: GeoUnit) -> Result<Vec<PathBuf>> {
        match self {
            PartitionSource::Single => Ok(vec![layout.unit_path(unit, None)]),
            PartitionSource::Manifest { ranges } => {
                if ranges.is_empty() {
                    return Err(PrepError::Configuration(format!(
                        "Partition manifest for '{}' is empty",
                        unit
                    )));
                }
                if let Some(bad) = ranges.iter().find(|r| r.start >= r.end) {
                    return Err(PrepError::Configuration(format!(
                        "Partition range {}..{} for '{}' is empty or reversed",
                        bad.start, bad.end, unit
                    )));
                }
                Ok(ranges
                    .iter()
                    .map(|r| layout.unit_path(unit, Some(*r)))
                    .collect())
            }
            PartitionSource::Discover => {
                let ranges = layout.discover_partitions(unit)?;
                if ranges.is_empty() {
                    return Err(PrepError::Configuration(format!(
                        "No partition files found for '{}' under '{}'",
                        unit, layout.base_path
                    )));
                }
                Ok(ranges
                    .into_iter()
                    .map(|r| layout.unit_path(unit, Some(r)))
                    .collect())
            }
        }
    }
}

/// Base path prefix and format shared by all geometry sources
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLayout {
    /// Prefix prepended verbatim to every file name (usually a directory
    /// ending in `/`)
    pub base_path: String,
    pub format: String,
}

impl SourceLayout {
    pub fn new(base_path: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            format: format.into(),
        }
    }

    /// `{base_path}{stem}_geometry[_<start>_<end>].<format>`
    pub fn unit_path(&self, unit: GeoUnit, range: Option<PartitionRange>) -> PathBuf {
        self.stem_path(unit.file_stem(), range.map(|r| format!("{}_{}", r.start, r.end)))
    }

    /// Path of an extra source named by suffix, e.g. `zipcode_geometry_2011_union`
    pub fn suffixed_path(&self, unit: GeoUnit, suffix: &str) -> PathBuf {
        self.stem_path(unit.file_stem(), Some(suffix.to_string()))
    }

    fn stem_path(&self, stem: &str, suffix: Option<String>) -> PathBuf {
        let name = match suffix {
            Some(suffix) => format!("{}{}_geometry_{}.{}", self.base_path, stem, suffix, self.format),
            None => format!("{}{}_geometry.{}", self.base_path, stem, self.format),
        };
        PathBuf::from(name)
    }

    /// Partition ranges present on disk for `unit`, sorted by start row
    pub fn discover_partitions(&self, unit: GeoUnit) -> Result<Vec<PartitionRange>> {
        let (dir, file_prefix) = split_base_path(&self.base_path);
        let prefix = format!("{}{}_geometry_", file_prefix, unit.file_stem());
        let suffix = format!(".{}", self.format);

        let mut ranges = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(middle) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
            else {
                continue;
            };
            if let Some(range) = parse_range(middle) {
                ranges.push(range);
            }
        }

        ranges.sort();
        Ok(ranges)
    }
}

fn chunk_ranges(chunk_size: usize, total: usize) -> Vec<PartitionRange> {
    (0..total)
        .step_by(chunk_size)
        .map(|start| PartitionRange::new(start, start + chunk_size))
        .collect()
}

fn split_base_path(base_path: &str) -> (PathBuf, String) {
    if base_path.is_empty() {
        return (PathBuf::from("."), String::new());
    }
    if base_path.ends_with('/') || base_path.ends_with(std::path::MAIN_SEPARATOR) {
        return (PathBuf::from(base_path), String::new());
    }
    let path = Path::new(base_path);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    (dir, prefix)
}

/// Parse `<start>_<end>`; anything else (e.g. `2011_union`) is not a partition
fn parse_range(s: &str) -> Option<PartitionRange> {
    let (start, end) = s.split_once('_')?;
    Some(PartitionRange::new(start.parse().ok()?, end.parse().ok()?))
}

/// Supplier of current state boundaries
pub trait BoundaryProvider {
    /// State boundaries with `STUSPS`, `NAME` and a WKT `geometry` column
    fn states(&self) -> Result<DataFrame>;
}

/// Reads state boundaries from `{base_path}state_geometry.<format>`
#[derive(Debug, Clone)]
pub struct FileBoundaryProvider {
    path: PathBuf,
}

impl FileBoundaryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_layout(layout: &SourceLayout) -> Self {
        Self::new(layout.unit_path(GeoUnit::State, None))
    }
}

impl BoundaryProvider for FileBoundaryProvider {
    fn states(&self) -> Result<DataFrame> {
        load_dataset(&self.path, DEFAULT_INFER_SCHEMA_LENGTH)
    }
}

/// An already-loaded boundary table
impl BoundaryProvider for DataFrame {
    fn states(&self) -> Result<DataFrame> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unit_path_pattern() {
        let layout = SourceLayout::new("data/", "parquet.gzip");
        assert_eq!(
            layout.unit_path(GeoUnit::BlockGroup, Some(PartitionRange::new(0, 40_000))),
            PathBuf::from("data/BG_geometry_0_40000.parquet.gzip")
        );
        assert_eq!(
            layout.unit_path(GeoUnit::County, None),
            PathBuf::from("data/County_geometry.parquet.gzip")
        );
        assert_eq!(
            layout.suffixed_path(GeoUnit::Zipcode, "2011_union"),
            PathBuf::from("data/zipcode_geometry_2011_union.parquet.gzip")
        );
    }

    #[test]
    fn test_default_manifests() {
        let PartitionSource::Manifest { ranges } = PartitionSource::default_for(GeoUnit::Zipcode) else {
            panic!("zipcode should be partitioned");
        };
        assert_eq!(ranges.len(), 6);
        assert_eq!(ranges[5], PartitionRange::new(250_000, 300_000));

        let PartitionSource::Manifest { ranges } = PartitionSource::default_for(GeoUnit::Tract) else {
            panic!("tract should be partitioned");
        };
        assert_eq!(ranges, vec![PartitionRange::new(0, 30_000), PartitionRange::new(30_000, 60_000)]);

        assert_eq!(PartitionSource::default_for(GeoUnit::County), PartitionSource::Single);
    }

    #[test]
    fn test_chunked_matches_default() {
        assert_eq!(
            PartitionSource::chunked(40_000, 120_000).unwrap(),
            PartitionSource::default_for(GeoUnit::BlockGroup)
        );
        assert!(PartitionSource::chunked(0, 10).is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0_50000"), Some(PartitionRange::new(0, 50_000)));
        assert_eq!(parse_range("2011_union"), None);
        assert_eq!(parse_range("12"), None);
    }

    #[test]
    fn test_empty_manifest_rejected() {
        let layout = SourceLayout::new("data/", "csv");
        let source = PartitionSource::Manifest { ranges: vec![] };
        assert!(matches!(
            source.resolve(&layout, GeoUnit::Tract),
            Err(PrepError::Configuration(_))
        ));
    }

    #[test]
    fn test_discover_orders_by_start_and_skips_union() {
        let temp_dir = TempDir::new().unwrap();
        for name in [
            "zipcode_geometry_100_200.csv",
            "zipcode_geometry_0_100.csv",
            "zipcode_geometry_2011_union.csv",
            "Tract_geometry_0_100.csv",
            "zipcode_geometry_0_100.parquet",
        ] {
            std::fs::write(temp_dir.path().join(name), "geometry\n").unwrap();
        }

        let base = format!("{}/", temp_dir.path().display());
        let layout = SourceLayout::new(base, "csv");
        let ranges = layout.discover_partitions(GeoUnit::Zipcode).unwrap();
        assert_eq!(ranges, vec![PartitionRange::new(0, 100), PartitionRange::new(100, 200)]);
    }

    #[test]
    fn test_discover_with_file_prefix() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("v2_BG_geometry_0_10.csv"), "geometry\n").unwrap();
        std::fs::write(temp_dir.path().join("BG_geometry_10_20.csv"), "geometry\n").unwrap();

        let base = format!("{}/v2_", temp_dir.path().display());
        let layout = SourceLayout::new(base, "csv");
        let ranges = layout.discover_partitions(GeoUnit::BlockGroup).unwrap();
        assert_eq!(ranges, vec![PartitionRange::new(0, 10)]);
    }
}
