//! Pipeline module - harmonization, binning, preprocessing and selection

pub mod estimator;
pub mod geography;
pub mod loader;
pub mod preprocess;
pub mod selection;
pub mod temporal;

pub use geography::*;
pub use loader::*;
pub use preprocess::*;
pub use selection::*;
pub use temporal::*;
