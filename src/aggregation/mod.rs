pub mod error;
pub mod period_aggregator;
pub mod source;
