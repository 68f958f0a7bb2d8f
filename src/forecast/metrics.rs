//! Accuracy metrics for test-set predictions.

use crate::stats;
use serde::Serialize;
use std::fmt;

/// Decimal places used when metrics are shown.
pub const DISPLAY_DECIMALS: u32 = 2;

/// Test-set accuracy at full precision. Use [`EvaluationMetrics::rounded`] or the
/// `Display` impl for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl EvaluationMetrics {
    /// Compares equally long `actual` and `predicted` slices.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            mae: mae(actual, predicted),
            rmse: rmse(actual, predicted),
            r2: r2(actual, predicted),
        }
    }

    pub fn rounded(&self) -> Self {
        Self {
            mae: stats::round_to(self.mae, DISPLAY_DECIMALS),
            rmse: stats::round_to(self.rmse, DISPLAY_DECIMALS),
            r2: stats::round_to(self.r2, DISPLAY_DECIMALS),
        }
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE: {:.2}, RMSE: {:.2}, R²: {:.2}",
            self.mae, self.rmse, self.r2
        )
    }
}

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).collect();
    stats::mean(&errors)
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    let squared: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).collect();
    stats::mean(&squared).sqrt()
}

/// `1 - SS_res / SS_tot`. A constant `actual` scores 1.0 when predicted exactly and
/// 0.0 otherwise.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean = stats::mean(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
