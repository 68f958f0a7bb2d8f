//! Iterative z-score outlier removal.

use crate::analysis::error::AnalysisError;
use crate::stats;
use crate::types::error::TableError;
use crate::types::frame::{float_values, TabularExport};
use crate::types::observation::ObservationTable;
use log::debug;
use polars::prelude::*;

pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 3.0;

/// Result of [`remove_outliers`]: the converged table and every row taken out of it.
///
/// `kept.len() + outliers.len()` always equals the input length.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierRemoval {
    pub column: String,
    pub threshold: f64,
    /// Surviving rows, in their original order.
    pub kept: ObservationTable,
    /// Removed rows, in removal order (round by round, table order within a round).
    pub outliers: ObservationTable,
    /// Number of passes that removed at least one row.
    pub rounds: usize,
}

/// Standard scores of the present values, using the sample standard deviation.
///
/// Absent values get no score. A degenerate column (fewer than two present values, at
/// most two distinct values, or a zero or non-finite standard deviation) scores every
/// present value as 0 instead of dividing by zero.
pub fn z_scores(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present = stats::present_values(values);
    let mean = stats::mean(&present);
    let std = stats::sample_std(&present);
    let degenerate = present.len() < 2
        || stats::distinct_count(&present) <= 2
        || !std.is_finite()
        || std == 0.0;

    values
        .iter()
        .map(|value| {
            value.map(|x| if degenerate { 0.0 } else { (x - mean) / std })
        })
        .collect()
}

/// Removes rows whose `column` value lies `threshold` or more standard deviations from
/// the mean, recomputing mean and deviation over the survivors until a pass removes
/// nothing.
///
/// # Errors
///
/// * [`AnalysisError::InvalidThreshold`] if `threshold` is not a positive finite number.
/// * [`crate::TableError::MissingColumn`] (wrapped) if the column does not exist.
pub fn remove_outliers(
    table: &ObservationTable,
    column: &str,
    threshold: f64,
) -> Result<OutlierRemoval, AnalysisError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(AnalysisError::InvalidThreshold(threshold));
    }
    table.column_index(column)?;

    let mut kept = table.to_dataframe()?;
    let mut outliers = kept.clear();
    let mut rounds = 0;

    loop {
        let scores = z_scores(&float_values(&kept, column)?);
        let keep: Vec<bool> = scores
            .iter()
            .map(|score| score.map_or(true, |z| z.abs() < threshold))
            .collect();
        let keep = BooleanChunked::from_slice("keep".into(), &keep);
        let removed = kept.filter(&!&keep).map_err(TableError::from)?;
        if removed.height() == 0 {
            break;
        }

        rounds += 1;
        debug!(
            "Outlier pass {} on '{}' removed {} of {} rows",
            rounds,
            column,
            removed.height(),
            kept.height()
        );
        outliers.vstack_mut(&removed).map_err(TableError::from)?;
        kept = kept.filter(&keep).map_err(TableError::from)?;
    }

    Ok(OutlierRemoval {
        column: column.to_string(),
        threshold,
        kept: ObservationTable::from_frame(&kept, table.columns())?,
        outliers: ObservationTable::from_frame(&outliers, table.columns())?,
        rounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn table(temperature: &[f64], wind: &[f64]) -> ObservationTable {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut table = ObservationTable::new(["temperature", "wind"]).unwrap();
        for (i, (t, w)) in temperature.iter().zip(wind).enumerate() {
            table
                .push_row(start + Duration::hours(i as i64), "SN18700", vec![Some(*t), Some(*w)])
                .unwrap();
        }
        table
    }

    #[test]
    fn converges_to_a_stricter_set_than_one_pass() {
        let input = table(&[1.0, 2.0, 3.0, 4.0, 100.0], &[5.0, 6.0, 7.0, 8.0, 9.0]);
        let removal = remove_outliers(&input, "temperature", 1.0).unwrap();

        assert_eq!(removal.kept.column("temperature").unwrap(), [Some(2.0), Some(3.0)]);
        assert_eq!(removal.kept.column("wind").unwrap(), [Some(6.0), Some(7.0)]);
        assert_eq!(
            removal.outliers.column("temperature").unwrap(),
            [Some(100.0), Some(1.0), Some(4.0)]
        );
        assert_eq!(removal.rounds, 2);
        assert_eq!(removal.kept.len() + removal.outliers.len(), input.len());
    }

    #[test]
    fn rerunning_on_converged_output_removes_nothing() {
        let temps: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).sin() * 5.0).chain([40.0, -35.0]).collect();
        let winds = vec![3.0; temps.len()];
        let first = remove_outliers(&table(&temps, &winds), "temperature", 3.0).unwrap();
        assert!(first.outliers.len() >= 2);

        let second = remove_outliers(&first.kept, "temperature", 3.0).unwrap();
        assert!(second.outliers.is_empty());
        assert_eq!(second.kept, first.kept);
        assert_eq!(second.rounds, 0);
    }

    #[test]
    fn constant_column_has_no_outliers() {
        let input = table(&[7.0; 6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let removal = remove_outliers(&input, "temperature", 0.5).unwrap();
        assert_eq!(removal.kept, input);
        assert!(removal.outliers.is_empty());
        assert_eq!(z_scores(input.column("temperature").unwrap()), vec![Some(0.0); 6]);
    }

    #[test]
    fn absent_values_are_kept_and_unscored() {
        let mut input = table(&[1.0, 2.0, 3.0, 50.0, 2.5], &[0.0; 5]);
        input
            .push_row(Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap(), "SN18700", vec![None, Some(0.0)])
            .unwrap();
        let scores = z_scores(input.column("temperature").unwrap());
        assert_eq!(scores[5], None);

        let removal = remove_outliers(&input, "temperature", 1.5).unwrap();
        assert!(removal.kept.column("temperature").unwrap().contains(&None));
        assert!(!removal.kept.column("temperature").unwrap().contains(&Some(50.0)));
    }

    #[test]
    fn rejects_bad_threshold_and_unknown_column() {
        let input = table(&[1.0, 2.0], &[1.0, 2.0]);
        assert!(matches!(
            remove_outliers(&input, "temperature", 0.0),
            Err(AnalysisError::InvalidThreshold(_))
        ));
        assert!(matches!(
            remove_outliers(&input, "pressure", 3.0),
            Err(AnalysisError::Table(TableError::MissingColumn { .. }))
        ));
    }
}
