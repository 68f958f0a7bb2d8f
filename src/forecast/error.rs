use crate::types::error::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Lag features have not been prepared; call prepare_data first")]
    NotPrepared,

    #[error("Data has not been split into train and test sets; call split_data first")]
    NotSplit,

    #[error("Model has not been trained; call train_model first")]
    ModelNotTrained,

    #[error("Model has not produced test-set predictions; call predict first")]
    NotPredicted,

    #[error("Test fraction must lie strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),

    #[error("{partition} partition needs at least {needed} rows, got {found}")]
    InsufficientTrainingData {
        partition: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("Table holds several stations ({stations:?}); choose one to build a single series")]
    AmbiguousSeries { stations: Vec<String> },

    #[error("Station '{0}' has no rows in the table")]
    UnknownStation(String),
}
