use crate::aggregation::error::AggregationError;
use crate::analysis::error::AnalysisError;
use crate::forecast::error::ForecastError;
use crate::payload::error::PayloadError;
use crate::types::error::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrostcastError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Invalid configuration")]
    Config(#[source] serde_json::Error),
}
