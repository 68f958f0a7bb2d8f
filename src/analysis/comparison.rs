//! Side-by-side summary of the same quantity from historical and forecast data.

use crate::analysis::error::AnalysisError;
use crate::stats;
use crate::types::error::TableError;
use crate::types::frame::TabularExport;
use crate::types::observation::ObservationTable;
use polars::prelude::*;
use serde::Serialize;

/// Location summary of one column in one table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceComparison {
    pub historical_column: String,
    pub forecast_column: String,
    pub historical: SourceSummary,
    pub forecast: SourceSummary,
}

impl SourceComparison {
    /// Forecast mean minus historical mean.
    pub fn mean_difference(&self) -> f64 {
        self.forecast.mean - self.historical.mean
    }
}

impl TabularExport for SourceComparison {
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let pick = |f: fn(&SourceSummary) -> f64| vec![f(&self.historical), f(&self.forecast)];
        Ok(DataFrame::new(vec![
            Series::new("source".into(), ["historical", "forecast"]).into(),
            Series::new(
                "column".into(),
                [self.historical_column.as_str(), self.forecast_column.as_str()],
            )
            .into(),
            Series::new("count".into(), [self.historical.count as u64, self.forecast.count as u64]).into(),
            Series::new("mean".into(), pick(|s| s.mean)).into(),
            Series::new("median".into(), pick(|s| s.median)).into(),
            Series::new("std_dev".into(), pick(|s| s.std_dev)).into(),
        ])?)
    }
}

fn summarize(table: &ObservationTable, column: &str) -> Result<SourceSummary, AnalysisError> {
    let present = stats::present_values(table.column(column)?);
    if present.is_empty() {
        return Err(AnalysisError::EmptyColumn {
            column: column.to_string(),
        });
    }
    Ok(SourceSummary {
        count: present.len(),
        mean: stats::mean(&present),
        median: stats::median(&present),
        std_dev: stats::population_std(&present),
    })
}

/// Summarizes `historical_column` of `historical` against `forecast_column` of
/// `forecast`. The two tables need not share timestamps.
///
/// # Errors
///
/// `MissingColumn` (wrapped) if either side lacks its column, `EmptyColumn` if either
/// column has no present value.
pub fn compare_sources(
    historical: &ObservationTable,
    forecast: &ObservationTable,
    historical_column: &str,
    forecast_column: &str,
) -> Result<SourceComparison, AnalysisError> {
    Ok(SourceComparison {
        historical_column: historical_column.to_string(),
        forecast_column: forecast_column.to_string(),
        historical: summarize(historical, historical_column)?,
        forecast: summarize(forecast, forecast_column)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn single_column(name: &str, values: &[Option<f64>]) -> ObservationTable {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut table = ObservationTable::new([name]).unwrap();
        for (i, v) in values.iter().enumerate() {
            table.push_row(start + Duration::hours(i as i64), "SN18700", vec![*v]).unwrap();
        }
        table
    }

    #[test]
    fn summarizes_both_sides() {
        let frost = single_column("temperature", &[Some(10.0), Some(12.0), None, Some(14.0)]);
        let yr = single_column("air_temperature", &[Some(11.0), Some(11.0)]);
        let comparison = compare_sources(&frost, &yr, "temperature", "air_temperature").unwrap();

        assert_eq!(comparison.historical.count, 3);
        assert_relative_eq!(comparison.historical.mean, 12.0);
        assert_relative_eq!(comparison.historical.std_dev, (8.0f64 / 3.0).sqrt());
        assert_relative_eq!(comparison.forecast.std_dev, 0.0);
        assert_relative_eq!(comparison.mean_difference(), -1.0);

        let frame = comparison.to_dataframe().unwrap();
        assert_eq!(frame.shape(), (2, 6));
    }

    #[test]
    fn missing_column_on_either_side_fails() {
        let frost = single_column("temperature", &[Some(1.0)]);
        let yr = single_column("wind_speed", &[Some(1.0)]);
        assert!(matches!(
            compare_sources(&frost, &yr, "temperature", "temperature"),
            Err(AnalysisError::Table(TableError::MissingColumn { .. }))
        ));
    }
}
