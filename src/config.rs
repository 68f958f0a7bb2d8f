//! Configuration for the observation source, the analysis and the forecast.
//!
//! Every struct deserializes from JSON with missing fields falling back to their
//! defaults, and can be assembled in code through its `bon` builder.

use crate::analysis::analyzer::DEFAULT_ROLLING_WINDOW;
use crate::analysis::normality::DEFAULT_ALPHA;
use crate::analysis::outliers::DEFAULT_Z_SCORE_THRESHOLD;
use crate::error::FrostcastError;
use crate::types::interval::ChunkInterval;
use bon::Builder;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const FROST_ENDPOINT: &str = "https://frost.met.no/observations/v0.jsonld";

/// Maps an observation API element to a measurement column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementMapping {
    pub element_id: String,
    pub column: String,
}

impl ElementMapping {
    pub fn new(element_id: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            column: column.into(),
        }
    }
}

fn default_sources() -> Vec<String> {
    ["SN18700", "SN90450", "SN50539", "SN69100"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_elements() -> Vec<ElementMapping> {
    vec![
        ElementMapping::new("air_temperature", "temperature"),
        ElementMapping::new("cloud_area_fraction", "cloud_area_fraction"),
        ElementMapping::new("wind_speed", "wind_speed"),
    ]
}

/// Settings handed to whatever fetches observations from the Frost API.
///
/// Credentials are supplied by the caller, never compiled in. The default has an
/// empty `client_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct FrostConfig {
    #[builder(into, default)]
    pub client_id: String,
    #[builder(into, default = FROST_ENDPOINT.to_string())]
    pub endpoint: String,
    /// Station identifiers, e.g. `SN18700` (Oslo Blindern).
    #[builder(default = default_sources())]
    pub sources: Vec<String>,
    #[builder(default = default_elements())]
    pub elements: Vec<ElementMapping>,
    #[builder(into, default = "PT1H".to_string())]
    pub time_resolution: String,
}

impl Default for FrostConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FrostConfig {
    /// Measurement columns, in element order.
    pub fn columns(&self) -> Vec<String> {
        self.elements.iter().map(|e| e.column.clone()).collect()
    }

    /// The column an element is stored in, if it is mapped.
    pub fn column_for(&self, element_id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.element_id == element_id)
            .map(|e| e.column.as_str())
    }

    /// Query parameters for one request covering `[start, end)`. The reference time is
    /// sent as an RFC 3339 interval, so chunk bounds are never widened to whole days.
    pub fn query_params(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let elements: Vec<&str> = self.elements.iter().map(|e| e.element_id.as_str()).collect();
        vec![
            ("sources", self.sources.join(",")),
            ("elements", elements.join(",")),
            ("timeresolutions", self.time_resolution.clone()),
            (
                "referencetime",
                format!(
                    "{}/{}",
                    start.to_rfc3339_opts(SecondsFormat::Secs, true),
                    end.to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
            ),
        ]
    }

    /// Everything a transport needs for one chunk: endpoint, credentials and parameters.
    pub fn request(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> FrostRequest<'_> {
        FrostRequest {
            endpoint: &self.endpoint,
            client_id: &self.client_id,
            params: self.query_params(start, end),
        }
    }
}

/// One observation request, as handed to a Frost transport.
///
/// Frost authenticates with HTTP basic auth: `client_id` is the user name and the
/// password is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrostRequest<'a> {
    pub endpoint: &'a str,
    pub client_id: &'a str,
    pub params: Vec<(&'static str, String)>,
}

impl FrostRequest<'_> {
    /// Value of one query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Cleaning and statistics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Column scored by the outlier remover.
    #[builder(into, default = "temperature".to_string())]
    pub target_column: String,
    #[builder(default = DEFAULT_Z_SCORE_THRESHOLD)]
    pub z_score_threshold: f64,
    /// Significance level of the normality test.
    #[builder(default = DEFAULT_ALPHA)]
    pub alpha: f64,
    #[builder(default = DEFAULT_ROLLING_WINDOW)]
    pub rolling_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_covariates() -> Vec<String> {
    vec!["cloud_area_fraction".to_string(), "wind_speed".to_string()]
}

/// Forecast model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ForecastConfig {
    #[builder(into, default = "temperature".to_string())]
    pub target_column: String,
    /// Columns whose lag-1 values join the target's own lag as predictors.
    #[builder(default = default_covariates())]
    pub covariates: Vec<String>,
    /// Share of the lag rows, taken from the end of the series, held out for testing.
    #[builder(default = 0.2)]
    pub test_fraction: f64,
    /// Number of steps for walk-forward forecasting.
    #[builder(default = 24)]
    pub horizon: usize,
    /// Station whose series is modelled; required when the data holds several.
    #[builder(into)]
    pub station: Option<String>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Everything a [`WeatherPipeline`](crate::pipeline::WeatherPipeline) run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct PipelineConfig {
    #[builder(default)]
    pub frost: FrostConfig,
    #[builder(default)]
    pub analysis: AnalysisConfig,
    #[builder(default)]
    pub forecast: ForecastConfig,
    /// Chunk size for period aggregation.
    #[builder(default)]
    pub interval: ChunkInterval,
}

impl PipelineConfig {
    /// Parses a JSON document. Absent sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`FrostcastError::Config`] for malformed JSON or an unrecognized interval.
    pub fn from_json(json: &str) -> Result<Self, FrostcastError> {
        serde_json::from_str(json).map_err(FrostcastError::Config)
    }
}
