//! geoprep: geographic harmonization and incremental feature selection
//!
//! A library for preparing loss datasets for a downstream regression model:
//! harmonizing geometry tables across administrative units, binning loss
//! years, preprocessing features and picking the single derived feature that
//! lowers cross-validated error the most.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{PrepError, Result};
