//! Lag-1 feature construction and the chronological train/test split.

use crate::forecast::error::ForecastError;
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use log::warn;

/// Suffix appended to a column name to name its lag-1 feature.
pub const LAG_SUFFIX: &str = "_prev";

/// Row-major feature matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    n_features: usize,
}

impl FeatureMatrix {
    pub(crate) fn new(rows: Vec<Vec<f64>>, n_features: usize) -> Self {
        Self { rows, n_features }
    }

    /// `(rows, features)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.n_features)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lag-1 features of one station's series, ordered by time.
///
/// Row `i` holds the raw values of the preceding observation
/// (`[value_prev, covariate_a_prev, covariate_b_prev, ...]`) and the target is the
/// value observed at `timestamps[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LagFeatures {
    feature_names: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
    features: FeatureMatrix,
    target: Vec<f64>,
    last_observed: Vec<f64>,
}

impl LagFeatures {
    /// Builds lag features for `target` and `covariates` from `table`.
    ///
    /// The series is the rows of `station` if given, otherwise the whole table, which
    /// must then hold a single station. Rows are put in time order first. A row is kept
    /// only when both it and its predecessor have every input present, so the first row
    /// never yields a sample and a gap in any covariate drops two samples.
    ///
    /// # Errors
    ///
    /// * `MissingColumn` (wrapped) for an unknown target or covariate.
    /// * [`ForecastError::UnknownStation`] if `station` has no rows.
    /// * [`ForecastError::AmbiguousSeries`] if no station is given and several are present.
    /// * [`ForecastError::InsufficientTrainingData`] if no complete lag row remains.
    pub fn build(
        table: &ObservationTable,
        target: &str,
        covariates: &[String],
        station: Option<&str>,
    ) -> Result<Self, ForecastError> {
        let series = select_series(table, station)?.sorted_by_timestamp()?;

        let mut indices = vec![series.column_index(target)?];
        for covariate in covariates {
            indices.push(series.column_index(covariate)?);
        }
        let feature_names = std::iter::once(target)
            .chain(covariates.iter().map(String::as_str))
            .map(|name| format!("{name}{LAG_SUFFIX}"))
            .collect();

        let raw_row = |row: usize| -> Option<Vec<f64>> {
            indices
                .iter()
                .map(|&index| series.column_at(index)[row])
                .collect()
        };

        let mut timestamps = Vec::new();
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for row in 1..series.len() {
            let (Some(previous), Some(current)) = (raw_row(row - 1), raw_row(row)) else {
                continue;
            };
            timestamps.push(series.timestamps()[row]);
            rows.push(previous);
            targets.push(current[0]);
        }

        let insufficient = ForecastError::InsufficientTrainingData {
            partition: "lag feature",
            needed: 1,
            found: 0,
        };
        if rows.is_empty() {
            return Err(insufficient);
        }
        let last_observed = (0..series.len())
            .rev()
            .find_map(raw_row)
            .ok_or(insufficient)?;

        Ok(Self {
            feature_names,
            timestamps,
            features: FeatureMatrix::new(rows, indices.len()),
            target: targets,
            last_observed,
        })
    }

    /// Feature column names, e.g. `["temperature_prev", "wind_speed_prev"]`.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Raw `[value, covariates...]` of the most recent complete observation, the seed
    /// for walk-forward forecasting.
    pub fn last_observed(&self) -> &[f64] {
        &self.last_observed
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Splits chronologically: the first `floor(len * (1 - test_fraction))` rows train,
    /// the rest test. Nothing is shuffled.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InvalidTestFraction`] unless `0 < test_fraction < 1`.
    /// * [`ForecastError::InsufficientTrainingData`] if either side would be empty.
    pub fn split(&self, test_fraction: f64) -> Result<TrainTestSplit, ForecastError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ForecastError::InvalidTestFraction(test_fraction));
        }
        let n = self.len();
        let split_index = (n as f64 * (1.0 - test_fraction)).floor() as usize;
        if split_index == 0 {
            return Err(ForecastError::InsufficientTrainingData {
                partition: "train",
                needed: 1,
                found: 0,
            });
        }
        if split_index >= n {
            return Err(ForecastError::InsufficientTrainingData {
                partition: "test",
                needed: 1,
                found: 0,
            });
        }

        let (train_rows, test_rows) = self.features.rows.split_at(split_index);
        let (y_train, y_test) = self.target.split_at(split_index);
        let width = self.features.n_features;
        Ok(TrainTestSplit {
            x_train: FeatureMatrix::new(train_rows.to_vec(), width),
            x_test: FeatureMatrix::new(test_rows.to_vec(), width),
            y_train: y_train.to_vec(),
            y_test: y_test.to_vec(),
            test_timestamps: self.timestamps[split_index..].to_vec(),
        })
    }
}

/// A chronological partition of [`LagFeatures`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
    pub test_timestamps: Vec<DateTime<Utc>>,
}

fn select_series(
    table: &ObservationTable,
    station: Option<&str>,
) -> Result<ObservationTable, ForecastError> {
    match station {
        Some(station) => {
            let rows = table.for_station(station)?;
            if rows.is_empty() {
                warn!("Station {station} has no rows to forecast from");
                return Err(ForecastError::UnknownStation(station.to_string()));
            }
            Ok(rows)
        }
        None => {
            let stations = table.stations();
            if stations.len() > 1 {
                return Err(ForecastError::AmbiguousSeries {
                    stations: stations.into_iter().map(str::to_string).collect(),
                });
            }
            Ok(table.clone())
        }
    }
}
