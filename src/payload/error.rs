use crate::types::error::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Failed to parse response body as JSON")]
    Json(#[from] serde_json::Error),

    #[error("Record {index} has an unparseable time '{time}'")]
    InvalidTime { index: usize, time: String },

    #[error("Request to the weather service failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Table(#[from] TableError),
}
