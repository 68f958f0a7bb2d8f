mod aggregation;
mod analysis;
mod config;
mod error;
mod forecast;
pub mod payload;
mod pipeline;
pub mod stats;
mod types;

pub use error::FrostcastError;
pub use pipeline::*;

pub use config::*;

pub use types::error::TableError;
pub use types::frame::*;
pub use types::interval::*;
pub use types::observation::*;

pub use analysis::analyzer::*;
pub use analysis::comparison::*;
pub use analysis::correlation::*;
pub use analysis::missing::*;
pub use analysis::normality::*;
pub use analysis::outliers::*;
pub use analysis::rolling::*;
pub use analysis::skewness::*;
pub use analysis::summary::*;

pub use forecast::engine::*;
pub use forecast::features::*;
pub use forecast::metrics::*;
pub use forecast::regression::*;

pub use aggregation::period_aggregator::*;
pub use aggregation::source::*;

pub use payload::frost::decode_observations;
pub use payload::yr::decode_forecast;

pub use aggregation::error::AggregationError;
pub use analysis::error::AnalysisError;
pub use forecast::error::ForecastError;
pub use payload::error::PayloadError;
