//! The [`Analyzer`]: cleaning and descriptive statistics over one observation table.

use crate::analysis::comparison::{compare_sources, SourceComparison};
use crate::analysis::correlation::{self, CorrelationMatrix};
use crate::analysis::error::AnalysisError;
use crate::analysis::missing::fill_missing_by_station;
use crate::analysis::normality::{test_normality, NormalityTest, DEFAULT_ALPHA};
use crate::analysis::outliers::{self, OutlierRemoval, DEFAULT_Z_SCORE_THRESHOLD};
use crate::analysis::rolling::{self, RollingStatistics};
use crate::analysis::skewness::{handle_skewness, SkewTransformation};
use crate::analysis::summary::{calculate_all_statistics, calculate_statistics, ColumnStatistics, StatisticsSummary};
use crate::types::observation::ObservationTable;
use bon::bon;

/// Trailing window used by [`Analyzer::rolling_statistics`] when none is given.
pub const DEFAULT_ROLLING_WINDOW: usize = 3;

/// Cleans and describes a single observation table.
///
/// An `Analyzer` owns an immutable snapshot of its data. Operations that change the data
/// ([`fill_missing`](Analyzer::fill_missing), [`remove_outliers`](Analyzer::remove_outliers))
/// never touch the snapshot; they hand back new values, so an earlier `Analyzer` stays
/// valid and no result silently aliases a later one.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use frostcast::{Analyzer, ObservationTable};
///
/// let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let mut table = ObservationTable::new(["temperature", "wind_speed"]).unwrap();
/// for (i, t) in [1.0, 2.0, 3.0, 4.0, 100.0].into_iter().enumerate() {
///     let at = start + Duration::hours(i as i64);
///     table.push_row(at, "SN18700", vec![Some(t), Some(5.0 + i as f64)]).unwrap();
/// }
///
/// let analyzer = Analyzer::new(table);
/// let removal = analyzer
///     .remove_outliers()
///     .column("temperature")
///     .z_score_threshold(1.0)
///     .call()
///     .unwrap();
/// assert!(!removal.kept.column("temperature").unwrap().contains(&Some(100.0)));
///
/// let cleaned = Analyzer::new(removal.kept);
/// let stats = cleaned.statistics("temperature").unwrap();
/// assert_eq!(stats.mean, 2.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analyzer {
    data: ObservationTable,
}

impl From<ObservationTable> for Analyzer {
    fn from(data: ObservationTable) -> Self {
        Analyzer::new(data)
    }
}

#[bon]
impl Analyzer {
    pub fn new(data: ObservationTable) -> Self {
        Self { data }
    }

    /// The table this analyzer describes.
    pub fn data(&self) -> &ObservationTable {
        &self.data
    }

    pub fn into_data(self) -> ObservationTable {
        self.data
    }

    /// A new analyzer over this data with gaps filled per station (forward, then
    /// backward). See [`fill_missing_by_station`].
    pub fn fill_missing(&self) -> Result<Analyzer, AnalysisError> {
        Ok(Analyzer::new(fill_missing_by_station(&self.data)?))
    }

    /// Iteratively removes rows whose `column` value has a z-score of at least
    /// `z_score_threshold` (default 3.0), until a pass removes nothing.
    ///
    /// # Builder Methods
    ///
    /// * `.column(&str)`: **Required.** The measurement column to score.
    /// * `.z_score_threshold(f64)`: Optional. Removal threshold τ; rows with `|z| >= τ` go.
    ///
    /// # Returns
    ///
    /// An [`OutlierRemoval`] holding the converged table and every removed row. Wrap
    /// `removal.kept` in a new `Analyzer` to keep working on the cleaned data.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::InvalidThreshold`] for a non-positive or non-finite threshold.
    /// * [`AnalysisError::Table`] with `MissingColumn` for an unknown column.
    #[builder]
    pub fn remove_outliers(
        &self,
        column: &str,
        z_score_threshold: Option<f64>,
    ) -> Result<OutlierRemoval, AnalysisError> {
        let threshold = z_score_threshold.unwrap_or(DEFAULT_Z_SCORE_THRESHOLD);
        outliers::remove_outliers(&self.data, column, threshold)
    }

    /// Descriptive statistics of one column, ignoring absent values.
    pub fn statistics(&self, column: &str) -> Result<ColumnStatistics, AnalysisError> {
        calculate_statistics(column, self.data.column(column)?)
    }

    /// Descriptive statistics of every measurement column.
    pub fn all_statistics(&self) -> Result<StatisticsSummary, AnalysisError> {
        calculate_all_statistics(&self.data)
    }

    pub fn correlation_matrix(&self) -> Result<CorrelationMatrix, AnalysisError> {
        correlation::correlation_matrix(&self.data)
    }

    /// Pearson correlation between two columns over rows where both are present.
    pub fn correlation(&self, a: &str, b: &str) -> Result<f64, AnalysisError> {
        correlation::correlation(&self.data, a, b)
    }

    /// Shapiro–Wilk test on the present values of `column`.
    ///
    /// `.alpha(f64)` sets the significance level behind `is_normal` (default 0.05).
    #[builder]
    pub fn normality_test(
        &self,
        column: &str,
        alpha: Option<f64>,
    ) -> Result<NormalityTest, AnalysisError> {
        test_normality(self.data.column(column)?, alpha.unwrap_or(DEFAULT_ALPHA))
    }

    /// Chooses and applies a skew-reducing transform for `column`. See [`handle_skewness`].
    pub fn handle_skewness(&self, column: &str) -> Result<SkewTransformation, AnalysisError> {
        handle_skewness(column, self.data.column(column)?)
    }

    /// Skew transformation records for every measurement column, in column order.
    pub fn handle_all_skewness(&self) -> Result<Vec<SkewTransformation>, AnalysisError> {
        self.data
            .columns()
            .iter()
            .map(|column| self.handle_skewness(column))
            .collect()
    }

    /// Trailing rolling mean and standard deviation of `column`, per station, in table order.
    ///
    /// `.window(usize)` sets the window length (default 3). Each window needs only
    /// one present value for a mean and two for a standard deviation.
    #[builder]
    pub fn rolling_statistics(
        &self,
        column: &str,
        window: Option<usize>,
    ) -> Result<RollingStatistics, AnalysisError> {
        rolling::rolling_statistics(&self.data, column, window.unwrap_or(DEFAULT_ROLLING_WINDOW))
    }

    /// Compares `column` in this data with `forecast_column` of a forecast table.
    pub fn compare_with(
        &self,
        forecast: &ObservationTable,
        column: &str,
        forecast_column: &str,
    ) -> Result<SourceComparison, AnalysisError> {
        compare_sources(&self.data, forecast, column, forecast_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::skewness::TransformationType;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn analyzer() -> Analyzer {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut table = ObservationTable::new(["temperature", "wind"]).unwrap();
        let rows = [
            (Some(1.0), Some(5.0)),
            (None, Some(6.0)),
            (Some(3.0), Some(7.0)),
            (Some(4.0), None),
            (Some(100.0), Some(9.0)),
        ];
        for (i, (t, w)) in rows.into_iter().enumerate() {
            table
                .push_row(start + Duration::hours(i as i64), "SN18700", vec![t, w])
                .unwrap();
        }
        Analyzer::new(table)
    }

    #[test]
    fn fill_returns_a_new_snapshot() {
        let raw = analyzer();
        let filled = raw.fill_missing().unwrap();
        assert_eq!(raw.data().column("temperature").unwrap()[1], None);
        assert_eq!(filled.data().column("temperature").unwrap()[1], Some(1.0));
        assert_eq!(filled.data().column("wind").unwrap()[3], Some(7.0));
    }

    #[test]
    fn outlier_builder_uses_default_threshold() {
        let filled = analyzer().fill_missing().unwrap();
        // n = 5 caps the largest attainable sample z-score at (n - 1) / sqrt(n) < 3
        let removal = filled.remove_outliers().column("temperature").call().unwrap();
        assert!(removal.outliers.is_empty());
        assert_eq!(removal.threshold, 3.0);

        let strict = filled
            .remove_outliers()
            .column("temperature")
            .z_score_threshold(1.5)
            .call()
            .unwrap();
        assert_eq!(strict.outliers.column("temperature").unwrap(), [Some(100.0)]);
    }

    #[test]
    fn statistics_and_correlation_skip_absent_values() {
        let analyzer = analyzer();
        assert_relative_eq!(analyzer.statistics("wind").unwrap().mean, 6.75);
        assert_eq!(analyzer.all_statistics().unwrap().len(), 2);
        let r = analyzer.correlation("temperature", "wind").unwrap();
        assert!(r > 0.5 && r <= 1.0);
        assert_eq!(analyzer.correlation_matrix().unwrap().get("wind", "wind"), Some(1.0));
    }

    #[test]
    fn normality_skew_and_rolling_through_builders() {
        let analyzer = analyzer();
        let test = analyzer.normality_test().column("temperature").call().unwrap();
        assert!(!test.is_normal);
        let lenient = analyzer
            .normality_test()
            .column("temperature")
            .alpha(1e-12)
            .call()
            .unwrap();
        assert!(lenient.is_normal);

        let skew = analyzer.handle_skewness("temperature").unwrap();
        assert_eq!(skew.transformation, TransformationType::Log);
        assert_eq!(analyzer.handle_all_skewness().unwrap().len(), 2);

        let rolling = analyzer.rolling_statistics().column("wind").window(2).call().unwrap();
        assert_eq!(rolling.mean[3], Some(7.0));
        assert_eq!(rolling.window, 2);
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = analyzer().statistics("pressure").unwrap_err();
        assert_eq!(err.to_string(), "Required column 'pressure' not found in table");
    }
}
