pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod regression;
