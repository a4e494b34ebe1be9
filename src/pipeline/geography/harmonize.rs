//! Loading, renaming and cleaning one geometry table per unit type

use geo::Geometry;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use wkt::TryFromWkt;

use super::codes::{format_geographic_units, process_geographic_data};
use super::source::{BoundaryProvider, PartitionSource, SourceLayout, DEFAULT_SOURCE_FORMAT};
use super::unit::GeoUnit;
use crate::error::{PrepError, Result};
use crate::pipeline::loader::{column_names, load_dataset, require_columns, DEFAULT_INFER_SCHEMA_LENGTH};
use crate::pipeline::preprocess::drop_columns;
use crate::utils::{create_progress_bar, finish_with_success, print_info, print_warning};

/// Name of the WKT column in every geometry source
pub const SOURCE_GEOMETRY_COLUMN: &str = "geometry";
/// Column dropped from the zipcode union source before concatenation
pub const UNION_FLAG_COLUMN: &str = "flag";
/// State boundary columns kept from the boundary provider
pub const STATE_COLUMNS: [&str; 3] = ["STUSPS", "NAME", SOURCE_GEOMETRY_COLUMN];

/// Optional per-unit cleaning applied by [`harmonize_units`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCleaning {
    /// Code column → zero-padded width
    #[serde(default)]
    pub code_widths: BTreeMap<String, usize>,
    /// Deduplication key; the output is projected onto these columns. The
    /// unit's geometry column is always kept but is not part of the key.
    #[serde(default)]
    pub dedup_columns: Vec<String>,
    /// Columns that must be non-null after deduplication
    #[serde(default)]
    pub required_columns: Vec<String>,
}

fn default_format() -> String {
    DEFAULT_SOURCE_FORMAT.to_string()
}

fn default_zipcode_union() -> Option<String> {
    Some("2011_union".to_string())
}

/// Which units to load and where their sources live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizerConfig {
    /// Prefix of every source file, usually a directory ending in `/`
    pub base_path: String,
    pub units: Vec<GeoUnit>,
    #[serde(default = "default_format")]
    pub format: String,
    /// Overrides of [`PartitionSource::default_for`]
    #[serde(default)]
    pub partitions: BTreeMap<GeoUnit, PartitionSource>,
    /// Suffix of the extra zipcode source appended after the partitions
    #[serde(default = "default_zipcode_union")]
    pub zipcode_union: Option<String>,
    #[serde(default)]
    pub cleaning: BTreeMap<GeoUnit, UnitCleaning>,
}

impl HarmonizerConfig {
    pub fn new(base_path: impl Into<String>, units: Vec<GeoUnit>) -> Self {
        Self {
            base_path: base_path.into(),
            units,
            format: default_format(),
            partitions: BTreeMap::new(),
            zipcode_union: default_zipcode_union(),
            cleaning: BTreeMap::new(),
        }
    }

    pub fn layout(&self) -> SourceLayout {
        SourceLayout::new(self.base_path.clone(), self.format.clone())
    }

    pub fn partition_source(&self, unit: GeoUnit) -> PartitionSource {
        self.partitions
            .get(&unit)
            .cloned()
            .unwrap_or_else(|| PartitionSource::default_for(unit))
    }
}

/// One harmonized unit table: the frame, whose geometry column keeps the
/// WKT text under the unit-specific name, plus the parsed shapes in row
/// order.
#[derive(Debug, Clone)]
pub struct UnitTable {
    pub unit: GeoUnit,
    pub frame: DataFrame,
    pub geometries: Vec<Geometry<f64>>,
    /// Number of files the rows were read from
    pub source_count: usize,
}

impl UnitTable {
    pub fn geometry_column(&self) -> &'static str {
        self.unit.geometry_column()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Re-parse `geometries` after the frame was filtered or projected
    fn refresh_geometries(&mut self) -> Result<()> {
        self.geometries = parse_geometry_column(
            &self.frame,
            self.unit.geometry_column(),
            self.unit.name(),
        )?;
        Ok(())
    }
}

/// Load every requested unit and rename its geometry column to
/// `geometry_<unit>`. Units requested twice are loaded once.
pub fn load_and_rename_geographic_data_whole(
    config: &HarmonizerConfig,
    boundaries: &dyn BoundaryProvider,
) -> Result<BTreeMap<GeoUnit, UnitTable>> {
    let mut tables = BTreeMap::new();

    for &unit in &config.units {
        if tables.contains_key(&unit) {
            continue;
        }
        let table = load_unit(unit, config, boundaries)?;
        print_info(&format!(
            "Loaded {} {} rows from {} source(s) as '{}'",
            table.height(),
            unit,
            table.source_count,
            table.geometry_column()
        ));
        tables.insert(unit, table);
    }

    Ok(tables)
}

/// Load, rename, then apply each unit's configured code formatting and
/// deduplication.
pub fn harmonize_units(
    config: &HarmonizerConfig,
    boundaries: &dyn BoundaryProvider,
) -> Result<BTreeMap<GeoUnit, UnitTable>> {
    let mut tables = load_and_rename_geographic_data_whole(config, boundaries)?;

    for unit in config.cleaning.keys().filter(|u| !tables.contains_key(*u)) {
        print_warning(&format!(
            "Cleaning configured for {} but the unit was not requested; skipping",
            unit
        ));
    }

    for (unit, table) in tables.iter_mut() {
        let Some(cleaning) = config.cleaning.get(unit) else {
            continue;
        };

        if !cleaning.code_widths.is_empty() {
            table.frame = format_geographic_units(&table.frame, &cleaning.code_widths)?;
        }

        if !cleaning.dedup_columns.is_empty() {
            require_columns(&table.frame, &cleaning.dedup_columns)?;
            let before = table.height();
            // the key is the configured codes only; the geometry rides along
            // with the first row of each key
            let first_rows = table.frame.unique_stable(
                Some(cleaning.dedup_columns.as_slice()),
                UniqueKeepStrategy::First,
                None,
            )?;
            let mut projection = cleaning.dedup_columns.clone();
            let geometry_column = unit.geometry_column().to_string();
            if !projection.contains(&geometry_column) {
                projection.push(geometry_column);
            }
            table.frame =
                process_geographic_data(&first_rows, &projection, &cleaning.required_columns)?;
            table.refresh_geometries()?;
            print_info(&format!(
                "Cleaned {}: {} → {} rows",
                unit,
                before,
                table.height()
            ));
        }
    }

    Ok(tables)
}

fn load_unit(
    unit: GeoUnit,
    config: &HarmonizerConfig,
    boundaries: &dyn BoundaryProvider,
) -> Result<UnitTable> {
    if unit == GeoUnit::State {
        let states = boundaries.states()?;
        require_columns(&states, &STATE_COLUMNS)?;
        let states = states.select(STATE_COLUMNS)?;
        return finish_unit(unit, states, "state boundaries", 1);
    }

    let layout = config.layout();
    let paths = config.partition_source(unit).resolve(&layout, unit)?;

    let pb = create_progress_bar(paths.len() as u64, &format!("Reading {}", unit));
    let mut frames = Vec::with_capacity(paths.len() + 1);
    for path in &paths {
        let frame = read_geometry_source(path)?;
        frames.push(frame);
        pb.inc(1);
    }
    finish_with_success(&pb, &format!("Read {} {} partition(s)", paths.len(), unit));

    if unit == GeoUnit::Zipcode {
        if let Some(suffix) = &config.zipcode_union {
            let path = layout.suffixed_path(unit, suffix);
            let union = read_geometry_source(&path)?;
            frames.push(drop_columns(&union, &[UNION_FLAG_COLUMN])?);
        }
    }

    let source_count = frames.len();
    let combined = concat_in_order(frames)?;
    finish_unit(unit, combined, &layout.unit_path(unit, None).display().to_string(), source_count)
}

/// Read one source and check every geometry parses before it is combined
fn read_geometry_source(path: &Path) -> Result<DataFrame> {
    let frame = load_dataset(path, DEFAULT_INFER_SCHEMA_LENGTH)?;
    parse_geometry_column(&frame, SOURCE_GEOMETRY_COLUMN, &path.display().to_string())?;
    Ok(frame)
}

/// Stack frames in the given order, aligning columns by name on the first
fn concat_in_order(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Err(PrepError::Configuration(
            "No geometry sources to combine".to_string(),
        ));
    };
    let order = column_names(&combined);

    for frame in iter {
        require_columns(&frame, &order)?;
        let aligned = frame.select(order.iter().map(|c| c.as_str()))?;
        combined.vstack_mut(&aligned)?;
    }

    Ok(combined)
}

fn finish_unit(
    unit: GeoUnit,
    mut frame: DataFrame,
    source_name: &str,
    source_count: usize,
) -> Result<UnitTable> {
    let geometries = parse_geometry_column(&frame, SOURCE_GEOMETRY_COLUMN, source_name)?;
    frame.rename(SOURCE_GEOMETRY_COLUMN, unit.geometry_column().into())?;

    Ok(UnitTable {
        unit,
        frame,
        geometries,
        source_count,
    })
}

/// Parse every cell of a WKT column. Null or malformed cells are faults.
pub fn parse_geometry_column(
    df: &DataFrame,
    column: &str,
    source_name: &str,
) -> Result<Vec<Geometry<f64>>> {
    let col = df
        .column(column)
        .map_err(|_| PrepError::missing_column(column, column_names(df)))?;
    let text = col.str().map_err(|_| PrepError::GeometryParse {
        source_name: source_name.to_string(),
        row: 0,
        message: format!("column '{}' has type {}, expected WKT strings", column, col.dtype()),
    })?;

    text.iter()
        .enumerate()
        .map(|(row, value)| {
            let wkt_str = value.ok_or_else(|| PrepError::GeometryParse {
                source_name: source_name.to_string(),
                row,
                message: "geometry is missing".to_string(),
            })?;
            Geometry::<f64>::try_from_wkt_str(wkt_str).map_err(|e| PrepError::GeometryParse {
                source_name: source_name.to_string(),
                row,
                message: e.to_string(),
            })
        })
        .collect()
}
