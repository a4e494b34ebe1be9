//! CLI module - argument parsing and subcommand runners

pub mod args;
pub mod bin_years;
pub mod harmonize;
pub mod select;

pub use args::{derive_output_path, Cli, Commands};
pub use bin_years::run_bin_years;
pub use harmonize::{run_harmonize, HarmonizeOptions};
pub use select::{run_select, SelectOptions};
