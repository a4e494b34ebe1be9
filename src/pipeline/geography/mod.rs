//! Geographic harmonizer: per-unit geometry tables with unique geometry
//! column names and normalized unit codes

pub mod codes;
pub mod harmonize;
pub mod source;
pub mod unit;

pub use codes::{format_geographic_units, process_geographic_data};
pub use harmonize::{
    harmonize_units, load_and_rename_geographic_data_whole, parse_geometry_column,
    HarmonizerConfig, UnitCleaning, UnitTable,
};
pub use source::{
    BoundaryProvider, FileBoundaryProvider, PartitionRange, PartitionSource, SourceLayout,
    DEFAULT_SOURCE_FORMAT,
};
pub use unit::GeoUnit;
