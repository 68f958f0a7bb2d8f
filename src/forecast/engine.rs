//! The [`ForecastEngine`]: lag-1 linear regression with walk-forward forecasting.

use crate::config::ForecastConfig;
use crate::forecast::error::ForecastError;
use crate::forecast::features::{LagFeatures, TrainTestSplit};
use crate::forecast::metrics::EvaluationMetrics;
use crate::forecast::regression::LinearModel;
use crate::types::error::TableError;
use crate::types::frame::{datetime_column, float_column, TabularExport, TIMESTAMP_COLUMN};
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use log::{debug, info};
use polars::prelude::*;
use std::mem;

/// Where a [`ForecastEngine`] is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastState {
    Uninitialized,
    DataPrepared,
    Split,
    Trained,
    Predicted,
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Uninitialized,
    DataPrepared(LagFeatures),
    Split(LagFeatures, TrainTestSplit),
    Trained(LagFeatures, TrainTestSplit, LinearModel),
    Predicted(LagFeatures, TrainTestSplit, LinearModel, Vec<f64>),
}

impl Stage {
    fn state(&self) -> ForecastState {
        match self {
            Stage::Uninitialized => ForecastState::Uninitialized,
            Stage::DataPrepared(..) => ForecastState::DataPrepared,
            Stage::Split(..) => ForecastState::Split,
            Stage::Trained(..) => ForecastState::Trained,
            Stage::Predicted(..) => ForecastState::Predicted,
        }
    }

    fn features(&self) -> Option<&LagFeatures> {
        match self {
            Stage::Uninitialized => None,
            Stage::DataPrepared(f)
            | Stage::Split(f, ..)
            | Stage::Trained(f, ..)
            | Stage::Predicted(f, ..) => Some(f),
        }
    }

    fn split(&self) -> Option<&TrainTestSplit> {
        match self {
            Stage::Split(_, s) | Stage::Trained(_, s, _) | Stage::Predicted(_, s, ..) => Some(s),
            _ => None,
        }
    }

    fn model(&self) -> Option<&LinearModel> {
        match self {
            Stage::Trained(.., m) | Stage::Predicted(_, _, m, _) => Some(m),
            _ => None,
        }
    }

    fn predictions(&self) -> Option<&[f64]> {
        match self {
            Stage::Predicted(.., p) => Some(p),
            _ => None,
        }
    }

    /// Drops everything past the prepared features.
    fn into_features(self) -> Option<LagFeatures> {
        match self {
            Stage::Uninitialized => None,
            Stage::DataPrepared(f)
            | Stage::Split(f, ..)
            | Stage::Trained(f, ..)
            | Stage::Predicted(f, ..) => Some(f),
        }
    }

    /// Drops any trained model and predictions.
    fn into_split(self) -> Option<(LagFeatures, TrainTestSplit)> {
        match self {
            Stage::Split(f, s) | Stage::Trained(f, s, _) | Stage::Predicted(f, s, ..) => {
                Some((f, s))
            }
            _ => None,
        }
    }

    /// Drops any predictions.
    fn into_trained(self) -> Option<(LagFeatures, TrainTestSplit, LinearModel)> {
        match self {
            Stage::Trained(f, s, m) | Stage::Predicted(f, s, m, _) => Some((f, s, m)),
            _ => None,
        }
    }
}

/// Test-set actuals next to the model's predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResults {
    pub timestamps: Vec<DateTime<Utc>>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl TabularExport for ForecastResults {
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        Ok(DataFrame::new(vec![
            datetime_column(TIMESTAMP_COLUMN, &self.timestamps)?,
            Series::new("actual".into(), self.actual.as_slice()).into(),
            Series::new("predicted".into(), self.predicted.as_slice()).into(),
        ])?)
    }
}

/// A walk-forward forecast, one value per step after the last observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub target_column: String,
    pub values: Vec<f64>,
}

impl TabularExport for Forecast {
    /// Columns `step` (1-based) and the target column.
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let steps: Vec<u32> = (1..=self.values.len() as u32).collect();
        let values: Vec<Option<f64>> = self.values.iter().copied().map(Some).collect();
        Ok(DataFrame::new(vec![
            Series::new("step".into(), steps).into(),
            float_column(&self.target_column, &values),
        ])?)
    }
}

/// Fits `target ~ target_prev + covariates_prev` on one station's series and forecasts
/// the target ahead.
///
/// The engine moves through [`ForecastState`] in order: `prepare_data`, `split_data`,
/// `train_model`, `predict`. Repeating an earlier step discards everything computed
/// after it, so a model is never paired with data it was not trained on. Calling a
/// step before its prerequisites fails with a typed error.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use frostcast::{ForecastConfig, ForecastEngine, ObservationTable};
///
/// let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let mut table = ObservationTable::new(["temperature", "cloud_area_fraction", "wind_speed"]).unwrap();
/// for i in 0..6 {
///     let at = start + Duration::hours(i);
///     table.push_row(at, "SN18700", vec![Some(10.0 + 2.0 * i as f64), Some(0.0), Some(1.0)]).unwrap();
/// }
///
/// let mut engine = ForecastEngine::new(table, ForecastConfig::default());
/// engine.prepare_data().unwrap();
/// engine.split_data(0.5).unwrap();
/// engine.train_model().unwrap();
///
/// let forecast = engine.forecast(4).unwrap();
/// assert_eq!(forecast.values.len(), 4);
/// ```
#[derive(Debug)]
pub struct ForecastEngine {
    data: ObservationTable,
    config: ForecastConfig,
    stage: Stage,
}

impl ForecastEngine {
    pub fn new(data: ObservationTable, config: ForecastConfig) -> Self {
        Self {
            data,
            config,
            stage: Stage::Uninitialized,
        }
    }

    pub fn state(&self) -> ForecastState {
        self.stage.state()
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn data(&self) -> &ObservationTable {
        &self.data
    }

    /// Replaces the series and returns the engine to `Uninitialized`.
    pub fn set_data(&mut self, data: ObservationTable) {
        self.data = data;
        self.stage = Stage::Uninitialized;
    }

    /// Builds lag-1 features from the held series. Discards any previous split, model
    /// and predictions.
    pub fn prepare_data(&mut self) -> Result<&LagFeatures, ForecastError> {
        self.stage = Stage::Uninitialized;
        let features = LagFeatures::build(
            &self.data,
            &self.config.target_column,
            &self.config.covariates,
            self.config.station.as_deref(),
        )?;
        debug!(
            "Prepared {} lag rows for '{}' from {} observations",
            features.len(),
            self.config.target_column,
            self.data.len()
        );
        self.stage = Stage::DataPrepared(features);
        self.stage.features().ok_or(ForecastError::NotPrepared)
    }

    /// Splits the prepared features chronologically, `test_fraction` of the rows going
    /// to the test partition. Discards any model and predictions.
    pub fn split_data(&mut self, test_fraction: f64) -> Result<&TrainTestSplit, ForecastError> {
        let split = self
            .stage
            .features()
            .ok_or(ForecastError::NotPrepared)?
            .split(test_fraction)?;
        let features = mem::take(&mut self.stage)
            .into_features()
            .ok_or(ForecastError::NotPrepared)?;
        self.stage = Stage::Split(features, split);
        self.stage.split().ok_or(ForecastError::NotSplit)
    }

    /// Fits the linear model on the train partition. Discards earlier predictions.
    pub fn train_model(&mut self) -> Result<&LinearModel, ForecastError> {
        let model = {
            let features = self.stage.features().ok_or(ForecastError::NotPrepared)?;
            let split = self.stage.split().ok_or(ForecastError::NotSplit)?;
            LinearModel::fit(features.feature_names(), &split.x_train, &split.y_train)?
        };
        let (features, split) = mem::take(&mut self.stage)
            .into_split()
            .ok_or(ForecastError::NotSplit)?;
        info!(
            "Trained model for '{}' on {} rows: coefficients {:?}, intercept {:.4}",
            self.config.target_column,
            split.y_train.len(),
            model.coefficients,
            model.intercept
        );
        self.stage = Stage::Trained(features, split, model);
        self.stage.model().ok_or(ForecastError::ModelNotTrained)
    }

    /// Predicts the test partition with the trained model.
    pub fn predict(&mut self) -> Result<&[f64], ForecastError> {
        let predictions = {
            let model = self.stage.model().ok_or(ForecastError::ModelNotTrained)?;
            let split = self.stage.split().ok_or(ForecastError::NotSplit)?;
            model.predict(&split.x_test)
        };
        let (features, split, model) = mem::take(&mut self.stage)
            .into_trained()
            .ok_or(ForecastError::ModelNotTrained)?;
        self.stage = Stage::Predicted(features, split, model, predictions);
        self.stage.predictions().ok_or(ForecastError::NotPredicted)
    }

    /// MAE, RMSE and R² of the trained model on the test partition, at full precision.
    pub fn evaluate_model(&self) -> Result<EvaluationMetrics, ForecastError> {
        let model = self.stage.model().ok_or(ForecastError::ModelNotTrained)?;
        let split = self.stage.split().ok_or(ForecastError::NotSplit)?;
        let metrics = match self.stage.predictions() {
            Some(predictions) => EvaluationMetrics::compute(&split.y_test, predictions),
            None => EvaluationMetrics::compute(&split.y_test, &model.predict(&split.x_test)),
        };
        info!("Evaluated '{}': {}", self.config.target_column, metrics);
        Ok(metrics)
    }

    /// Test-set actuals and predictions, available after [`predict`](Self::predict).
    pub fn results(&self) -> Result<ForecastResults, ForecastError> {
        if self.stage.model().is_none() {
            return Err(ForecastError::ModelNotTrained);
        }
        let predictions = self.stage.predictions().ok_or(ForecastError::NotPredicted)?;
        let split = self.stage.split().ok_or(ForecastError::NotSplit)?;
        Ok(ForecastResults {
            timestamps: split.test_timestamps.clone(),
            actual: split.y_test.clone(),
            predicted: predictions.to_vec(),
        })
    }

    /// Forecasts `horizon` steps past the last observation.
    ///
    /// Each step feeds its prediction back in as the next lagged target, while the
    /// covariates stay at their last observed values. Errors compound over the horizon.
    /// A horizon of 0 yields no values.
    pub fn forecast(&self, horizon: usize) -> Result<Forecast, ForecastError> {
        let model = self.stage.model().ok_or(ForecastError::ModelNotTrained)?;
        let features = self.stage.features().ok_or(ForecastError::NotPrepared)?;

        let mut current = features.last_observed().to_vec();
        let mut values = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = model.predict_one(&current);
            values.push(next);
            current[0] = next;
        }

        Ok(Forecast {
            target_column: self.config.target_column.clone(),
            values,
        })
    }

    pub fn model(&self) -> Option<&LinearModel> {
        self.stage.model()
    }

    pub fn features(&self) -> Option<&LagFeatures> {
        self.stage.features()
    }

    pub fn split(&self) -> Option<&TrainTestSplit> {
        self.stage.split()
    }
}
