//! Trailing-window mean and standard deviation, per station.

use crate::analysis::error::AnalysisError;
use crate::types::error::TableError;
use crate::types::frame::{
    datetime_column, float_column, float_values, TabularExport, STATION_COLUMN, TIMESTAMP_COLUMN,
};
use crate::types::observation::ObservationTable;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;

const MEAN_COLUMN: &str = "rolling_mean";
const STD_COLUMN: &str = "rolling_std";

/// Rolling mean and sample standard deviation of one column, aligned with the rows it
/// was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingStatistics {
    pub column: String,
    pub window: usize,
    pub timestamps: Vec<DateTime<Utc>>,
    pub station_ids: Vec<String>,
    pub mean: Vec<Option<f64>>,
    pub std_dev: Vec<Option<f64>>,
}

impl TabularExport for RollingStatistics {
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        Ok(DataFrame::new(vec![
            datetime_column(TIMESTAMP_COLUMN, &self.timestamps)?,
            Series::new(STATION_COLUMN.into(), &self.station_ids).into(),
            float_column(MEAN_COLUMN, &self.mean),
            float_column(STD_COLUMN, &self.std_dev),
        ])?)
    }
}

/// Computes a trailing window over `column` ending at each row, separately for every
/// station.
///
/// Each window covers the current row and up to `window - 1` earlier rows of the same
/// station, in table order. Absent values inside a window are skipped; a window with no
/// present value yields no mean, and one with fewer than two present values yields no
/// standard deviation.
///
/// # Errors
///
/// * [`AnalysisError::InvalidWindow`] for a zero window.
/// * [`AnalysisError::Table`] with `MissingColumn` for an unknown column.
pub fn rolling_statistics(
    table: &ObservationTable,
    column: &str,
    window: usize,
) -> Result<RollingStatistics, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow);
    }
    table.column_index(column)?;

    let options = RollingOptionsFixedWindow {
        window_size: window,
        min_periods: 1,
        ..Default::default()
    };
    let frame = table
        .lazy()?
        .select([
            col(column)
                .rolling_mean(options.clone())
                .over([col(STATION_COLUMN)])
                .alias(MEAN_COLUMN),
            col(column)
                .rolling_std(options)
                .over([col(STATION_COLUMN)])
                .alias(STD_COLUMN),
        ])
        .collect()
        .map_err(TableError::from)?;

    Ok(RollingStatistics {
        column: column.to_string(),
        window,
        timestamps: table.timestamps().to_vec(),
        station_ids: table.station_ids().to_vec(),
        mean: float_values(&frame, MEAN_COLUMN)?,
        std_dev: float_values(&frame, STD_COLUMN)?,
    })
}
