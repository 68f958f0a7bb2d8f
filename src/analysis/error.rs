use crate::types::error::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Column '{column}' has no values to analyse")]
    EmptyColumn { column: String },

    #[error("{operation} needs at least {needed} values, got {found}")]
    InsufficientData {
        operation: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("Z-score threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),

    #[error("Rolling window must cover at least one row")]
    InvalidWindow,
}
