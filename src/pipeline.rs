//! End-to-end run: aggregate, clean, describe, fit and forecast.

use crate::aggregation::period_aggregator::PeriodAggregator;
use crate::aggregation::source::{FrostJsonSource, ObservationSource};
use crate::analysis::analyzer::Analyzer;
use crate::analysis::correlation::CorrelationMatrix;
use crate::analysis::error::AnalysisError;
use crate::analysis::normality::NormalityTest;
use crate::analysis::rolling::RollingStatistics;
use crate::analysis::skewness::SkewTransformation;
use crate::analysis::summary::StatisticsSummary;
use crate::config::{FrostRequest, PipelineConfig};
use crate::error::FrostcastError;
use crate::forecast::engine::{Forecast, ForecastEngine, ForecastResults};
use crate::forecast::error::ForecastError;
use crate::forecast::metrics::EvaluationMetrics;
use crate::forecast::regression::LinearModel;
use crate::types::error::TableError;
use crate::types::interval::PeriodBound;
use crate::types::observation::ObservationTable;
use log::{info, warn};
use std::error::Error;
use std::fmt::Debug;

/// Every output of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// The aggregated input, before any cleaning.
    pub raw: ObservationTable,
    /// Gap-filled data with outliers of the target column removed.
    pub cleaned: ObservationTable,
    /// Rows taken out by outlier removal.
    pub outliers: ObservationTable,
    pub outlier_rounds: usize,
    pub statistics: StatisticsSummary,
    pub correlation: CorrelationMatrix,
    /// Shapiro–Wilk result per column; `None` where the column has too few distinct values.
    pub normality: Vec<(String, Option<NormalityTest>)>,
    /// Skew handling per column; `None` where the column has fewer than three values.
    pub skewness: Vec<(String, Option<SkewTransformation>)>,
    /// Rolling statistics of the analysis target column, computed per station.
    pub rolling: RollingStatistics,
    pub model: LinearModel,
    pub metrics: EvaluationMetrics,
    pub results: ForecastResults,
    pub forecast: Forecast,
}

/// Runs the whole cleaning, analysis and forecasting chain with one configuration.
///
/// Each run builds its own [`Analyzer`] snapshots and [`ForecastEngine`], so a pipeline
/// can be reused across runs without state leaking between them.
#[derive(Debug, Clone, Default)]
pub struct WeatherPipeline {
    config: PipelineConfig,
}

impl WeatherPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Aggregates `[start, end)` from `source` in the configured interval, then
    /// [`analyze`](Self::analyze)s the result.
    pub fn run<S, A, B>(&self, source: S, start: A, end: B) -> Result<PipelineReport, FrostcastError>
    where
        S: ObservationSource,
        A: PeriodBound + Debug,
        B: PeriodBound + Debug,
    {
        let mut aggregator = PeriodAggregator::new(source, self.config.interval);
        let raw = aggregator.aggregate(start, end)?;
        self.analyze(raw)
    }

    /// [`run`](Self::run) against the Frost API described by the configuration's
    /// `frost` section, with `transport` performing the HTTP requests.
    pub fn run_frost<T, A, B>(&self, transport: T, start: A, end: B) -> Result<PipelineReport, FrostcastError>
    where
        T: FnMut(&FrostRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>>,
        A: PeriodBound + Debug,
        B: PeriodBound + Debug,
    {
        self.run(FrostJsonSource::new(self.config.frost.clone(), transport), start, end)
    }

    /// The station whose series is forecast.
    ///
    /// A configured station must be present in `data`. Without one, data from a single
    /// station needs no choice, and data from several uses the first configured Frost
    /// source that has rows.
    fn forecast_station(&self, data: &ObservationTable) -> Result<Option<String>, ForecastError> {
        let stations = data.stations();
        if let Some(station) = &self.config.forecast.station {
            if !stations.contains(&station.as_str()) {
                return Err(ForecastError::UnknownStation(station.clone()));
            }
            return Ok(Some(station.clone()));
        }
        if stations.len() <= 1 {
            return Ok(None);
        }
        match self
            .config
            .frost
            .sources
            .iter()
            .find(|source| stations.contains(&source.as_str()))
        {
            Some(source) => {
                info!("No forecast station configured, forecasting {source}");
                Ok(Some(source.clone()))
            }
            None => Err(ForecastError::AmbiguousSeries {
                stations: stations.into_iter().map(str::to_string).collect(),
            }),
        }
    }

    /// Cleans, describes and models an already aggregated table.
    ///
    /// # Errors
    ///
    /// Fails on the first step that fails: an empty table, a forecast station that is
    /// missing or cannot be chosen, a configured column that does not exist, a column
    /// with no values, or a forecast step without enough data.
    pub fn analyze(&self, raw: ObservationTable) -> Result<PipelineReport, FrostcastError> {
        if raw.is_empty() {
            return Err(TableError::EmptyDataset { operation: "pipeline" }.into());
        }
        let analysis = &self.config.analysis;
        let mut forecast_config = self.config.forecast.clone();
        forecast_config.station = self.forecast_station(&raw)?;

        let filled = Analyzer::new(raw.clone()).fill_missing()?;
        let removal = filled
            .remove_outliers()
            .column(&analysis.target_column)
            .z_score_threshold(analysis.z_score_threshold)
            .call()?;
        info!(
            "Removed {} outliers from '{}' in {} rounds",
            removal.outliers.len(),
            analysis.target_column,
            removal.rounds
        );
        let cleaned = Analyzer::new(removal.kept.clone());

        let statistics = cleaned.all_statistics()?;
        let correlation = cleaned.correlation_matrix()?;
        let mut normality = Vec::new();
        let mut skewness = Vec::new();
        for column in cleaned.data().columns() {
            let test = cleaned.normality_test().column(column).alpha(analysis.alpha).call();
            normality.push((column.clone(), tolerate_insufficient(column, test)?));
            skewness.push((
                column.clone(),
                tolerate_insufficient(column, cleaned.handle_skewness(column))?,
            ));
        }
        let rolling = cleaned
            .rolling_statistics()
            .column(&analysis.target_column)
            .window(analysis.rolling_window)
            .call()?;
        info!("Described {} columns over {} rows", statistics.len(), cleaned.data().len());

        let mut engine = ForecastEngine::new(cleaned.into_data(), forecast_config.clone());
        engine.prepare_data()?;
        engine.split_data(forecast_config.test_fraction)?;
        let model = engine.train_model()?.clone();
        engine.predict()?;
        let metrics = engine.evaluate_model()?;
        let results = engine.results()?;
        let forecast = engine.forecast(forecast_config.horizon)?;
        info!(
            "Forecast {} steps of '{}' ({})",
            forecast.values.len(),
            forecast_config.target_column,
            metrics
        );

        Ok(PipelineReport {
            raw,
            cleaned: engine.data().clone(),
            outliers: removal.outliers,
            outlier_rounds: removal.rounds,
            statistics,
            correlation,
            normality,
            skewness,
            rolling,
            model,
            metrics,
            results,
            forecast,
        })
    }
}

/// Turns "not enough data for this test" into `None`; every other error still fails.
fn tolerate_insufficient<T>(
    column: &str,
    result: Result<T, AnalysisError>,
) -> Result<Option<T>, AnalysisError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::InsufficientData { operation, needed, found }) => {
            warn!("Skipping {operation} for '{column}': needs {needed} values, has {found}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
