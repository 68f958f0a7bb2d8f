use crate::types::error::TableError;
use crate::types::interval::InvalidInterval;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    #[error("Period start {start} must be before its end {end}")]
    EmptyRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Could not interpret '{0}' as a period bound")]
    InvalidBound(String),

    #[error("Chunk after {0} overflows the calendar")]
    ChunkOverflow(DateTime<Utc>),

    #[error("Fetching observations for {start} to {end} failed")]
    Source {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
