//! Per-column descriptive statistics.

use crate::analysis::error::AnalysisError;
use crate::stats;
use crate::types::error::TableError;
use crate::types::frame::TabularExport;
use crate::types::observation::ObservationTable;
use polars::prelude::*;
use serde::Serialize;

/// Row labels of an exported [`StatisticsSummary`], in order.
pub const STATISTIC_NAMES: [&str; 7] = [
    "mean", "median", "std_dev", "minimum", "maximum", "skewness", "kurtosis",
];

/// Descriptive statistics of one column's present values.
///
/// `mean`, `median` and `std_dev` use population definitions. `skewness` is the
/// Fisher–Pearson coefficient and `kurtosis` is excess kurtosis (normal data gives 0),
/// both without bias correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl ColumnStatistics {
    /// Same statistics rounded to `decimals` places, for display.
    pub fn rounded(&self, decimals: u32) -> Self {
        let r = |v: f64| stats::round_to(v, decimals);
        ColumnStatistics {
            mean: r(self.mean),
            median: r(self.median),
            std_dev: r(self.std_dev),
            min: r(self.min),
            max: r(self.max),
            skewness: r(self.skewness),
            kurtosis: r(self.kurtosis),
        }
    }

    fn as_array(&self) -> [f64; 7] {
        [
            self.mean,
            self.median,
            self.std_dev,
            self.min,
            self.max,
            self.skewness,
            self.kurtosis,
        ]
    }
}

/// Statistics for a set of columns, in table column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSummary {
    columns: Vec<(String, ColumnStatistics)>,
}

impl StatisticsSummary {
    pub fn get(&self, column: &str) -> Option<&ColumnStatistics> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, s)| s)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStatistics)> {
        self.columns.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One row per statistic (`statistic` label column), one float column per variable.
impl TabularExport for StatisticsSummary {
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let mut frame_columns: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        frame_columns.push(Series::new("statistic".into(), STATISTIC_NAMES.to_vec()).into());
        for (name, statistics) in &self.columns {
            frame_columns.push(Series::new(name.as_str().into(), statistics.as_array().to_vec()).into());
        }
        Ok(DataFrame::new(frame_columns)?)
    }
}

/// Statistics of one column of raw values; absent values are skipped.
///
/// # Errors
///
/// [`AnalysisError::EmptyColumn`] when no value is present.
pub fn calculate_statistics(
    column: &str,
    values: &[Option<f64>],
) -> Result<ColumnStatistics, AnalysisError> {
    let present = stats::present_values(values);
    if present.is_empty() {
        return Err(AnalysisError::EmptyColumn {
            column: column.to_string(),
        });
    }

    Ok(ColumnStatistics {
        mean: stats::mean(&present),
        median: stats::median(&present),
        std_dev: stats::population_std(&present),
        min: stats::min(&present),
        max: stats::max(&present),
        skewness: stats::skewness(&present),
        kurtosis: stats::excess_kurtosis(&present),
    })
}

/// Statistics for every measurement column of `table`.
///
/// # Errors
///
/// * [`TableError::EmptyDataset`] (wrapped) for a table without rows.
/// * [`AnalysisError::EmptyColumn`] if a column has no present value at all.
pub fn calculate_all_statistics(
    table: &ObservationTable,
) -> Result<StatisticsSummary, AnalysisError> {
    if table.is_empty() {
        return Err(TableError::EmptyDataset {
            operation: "statistics summary",
        }
        .into());
    }

    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            calculate_statistics(name, table.column_at(index)).map(|s| (name.clone(), s))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StatisticsSummary { columns })
}
