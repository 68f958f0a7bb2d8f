use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Required column '{column}' not found in table")]
    MissingColumn { column: String },

    #[error("Cannot compute {operation} on an empty dataset")]
    EmptyDataset { operation: &'static str },

    #[error("Row has {found} measurement values but the table has {expected} columns")]
    RowLength { expected: usize, found: usize },

    #[error("Measurement column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("Tables have different measurement columns: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Row {row} has no valid timestamp")]
    InvalidTimestamp { row: usize },

    #[error("Row {row} has no station identifier")]
    MissingStation { row: usize },

    #[error("Failed processing DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Failed to write CSV file '{0}'")]
    CsvWrite(PathBuf, #[source] std::io::Error),
}

impl TableError {
    pub(crate) fn missing_column(column: &str) -> Self {
        TableError::MissingColumn {
            column: column.to_string(),
        }
    }
}
