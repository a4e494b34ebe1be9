//! Report module - run summaries and result exports

pub mod selection_export;
pub mod summary;

pub use selection_export::*;
pub use summary::*;
