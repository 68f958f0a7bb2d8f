//! Where the period aggregator gets its observations from.

use crate::config::{FrostConfig, FrostRequest};
use crate::payload::error::PayloadError;
use crate::payload::frost::decode_observations;
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use std::error::Error;

/// Fetches the observations recorded in one sub-interval `[start, end)`.
///
/// Implemented for any `FnMut(DateTime<Utc>, DateTime<Utc>) -> Result<ObservationTable, E>`,
/// so tests and callers with their own HTTP stack can pass a closure.
pub trait ObservationSource {
    type Error: Error + Send + Sync + 'static;

    fn fetch(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ObservationTable, Self::Error>;
}

impl<F, E> ObservationSource for F
where
    F: FnMut(DateTime<Utc>, DateTime<Utc>) -> Result<ObservationTable, E>,
    E: Error + Send + Sync + 'static,
{
    type Error = E;

    fn fetch(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ObservationTable, Self::Error> {
        self(start, end)
    }
}

/// An [`ObservationSource`] that asks a caller-supplied transport for the raw Frost
/// JSON of each chunk and decodes it with the configured element mapping.
///
/// The transport receives a [`FrostRequest`] built by [`FrostConfig::request`]
/// (endpoint, `client_id` for basic auth, query parameters) and returns the response body.
pub struct FrostJsonSource<T> {
    config: FrostConfig,
    transport: T,
}

impl<T> FrostJsonSource<T>
where
    T: FnMut(&FrostRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>>,
{
    pub fn new(config: FrostConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &FrostConfig {
        &self.config
    }
}

impl<T> ObservationSource for FrostJsonSource<T>
where
    T: FnMut(&FrostRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>>,
{
    type Error = PayloadError;

    fn fetch(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ObservationTable, Self::Error> {
        let request = self.config.request(start, end);
        let body = (self.transport)(&request).map_err(PayloadError::Transport)?;
        decode_observations(&body, &self.config)
    }
}
