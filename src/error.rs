//! Error types for the preparation pipelines.
//!
//! Every fault surfaces to the caller immediately. Nothing here is retried:
//! all inputs are in-memory tables or local files that were already read.

use polars::prelude::PolarsError;

/// Errors raised by harmonization, binning, preprocessing and selection.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Invalid configuration, caught before any table is transformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Row counts of base features, candidates and target disagree.
    #[error("Shape mismatch: {what} has {actual} rows, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Feature selection was asked to choose from zero candidates.
    #[error("Candidate table has no columns - nothing to select from")]
    EmptyCandidateSet,

    /// A requested column is absent from the table.
    #[error("Column '{column}' not found. Available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A WKT cell failed to parse. Indicates a corrupt source, so bad rows
    /// are never skipped.
    #[error("Failed to parse geometry in {source_name} at row {row}: {message}")]
    GeometryParse {
        source_name: String,
        row: usize,
        message: String,
    },

    /// A value could not be converted to the type the step requires.
    #[error("Cannot convert value {value:?} in column '{column}': {message}")]
    DataConversion {
        column: String,
        value: String,
        message: String,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrepError>;

impl PrepError {
    pub(crate) fn missing_column(column: &str, available: Vec<String>) -> Self {
        PrepError::MissingColumn {
            column: column.to_string(),
            available,
        }
    }

    pub(crate) fn conversion(column: &str, value: impl ToString, message: impl ToString) -> Self {
        PrepError::DataConversion {
            column: column.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shape_mismatch() {
        let err = PrepError::ShapeMismatch {
            what: "target".to_string(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch: target has 9 rows, expected 10"
        );
    }

    #[test]
    fn test_display_missing_column_lists_available() {
        let err = PrepError::missing_column("zip", vec!["a".to_string(), "b".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("'zip'"));
        assert!(msg.contains("\"a\""));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PrepError = io.into();
        assert!(matches!(err, PrepError::Io(_)));
    }
}
