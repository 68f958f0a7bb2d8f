//! Pearson correlation over pairwise-complete observations.

use crate::analysis::error::AnalysisError;
use crate::stats;
use crate::types::error::TableError;
use crate::types::frame::TabularExport;
use crate::types::observation::ObservationTable;
use polars::prelude::*;
use serde::Serialize;

/// Symmetric column × column correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Correlation between two named columns, `None` if either is not in the matrix.
    ///
    /// `NaN` marks an undefined coefficient (fewer than two complete pairs, or a
    /// constant column).
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }
}

/// A `column` label column followed by one float column per variable.
impl TabularExport for CorrelationMatrix {
    fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let mut frame_columns: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        frame_columns.push(Series::new("column".into(), self.columns.clone()).into());
        for (j, name) in self.columns.iter().enumerate() {
            let cells: Vec<f64> = self.values.iter().map(|row| row[j]).collect();
            frame_columns.push(Series::new(name.as_str().into(), cells).into());
        }
        Ok(DataFrame::new(frame_columns)?)
    }
}

fn complete_pairs(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip()
}

/// Pearson correlation between two columns, using rows where both are present.
///
/// # Errors
///
/// `MissingColumn` (wrapped) for an unknown column name.
pub fn correlation(table: &ObservationTable, a: &str, b: &str) -> Result<f64, AnalysisError> {
    let (xs, ys) = complete_pairs(table.column(a)?, table.column(b)?);
    Ok(stats::pearson(&xs, &ys))
}

/// Correlation matrix over every measurement column of `table`.
///
/// The diagonal is 1.0 for any column with variance, `NaN` for a degenerate one.
///
/// # Errors
///
/// [`TableError::EmptyDataset`] (wrapped) for a table without rows.
pub fn correlation_matrix(table: &ObservationTable) -> Result<CorrelationMatrix, AnalysisError> {
    if table.is_empty() {
        return Err(TableError::EmptyDataset {
            operation: "correlation matrix",
        }
        .into());
    }

    let n = table.columns().len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let (xs, ys) = complete_pairs(table.column_at(i), table.column_at(j));
            let r = if i == j {
                // pearson() of a column with itself can land a hair off 1.0
                if stats::pearson(&xs, &ys).is_nan() { f64::NAN } else { 1.0 }
            } else {
                stats::pearson(&xs, &ys)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: table.columns().to_vec(),
        values,
    })
}
