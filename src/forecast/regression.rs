//! Ordinary least squares on a small dense feature matrix.

use crate::forecast::error::ForecastError;
use crate::forecast::features::FeatureMatrix;
use crate::stats;
use serde::Serialize;

/// Pivots smaller than this fraction of the largest feature variance count as zero.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// A fitted linear model `y = intercept + Σ coefficients[j] · x[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Fits by least squares on mean-centered data, solving the normal equations with
    /// Gauss–Jordan elimination.
    ///
    /// Features without variance, or linearly dependent on earlier ones, get a
    /// coefficient of 0 and the intercept absorbs their level.
    pub fn fit(
        feature_names: &[String],
        x: &FeatureMatrix,
        y: &[f64],
    ) -> Result<Self, ForecastError> {
        let (n, k) = x.shape();
        if n == 0 || n != y.len() {
            return Err(ForecastError::InsufficientTrainingData {
                partition: "train",
                needed: 1,
                found: n.min(y.len()),
            });
        }

        let rows = x.rows();
        let x_mean: Vec<f64> = (0..k)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = stats::mean(y);

        // [XᵀX | Xᵀy] over centered data
        let mut system = vec![vec![0.0; k + 1]; k];
        for (row, target) in rows.iter().zip(y) {
            let centered: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let dy = target - y_mean;
            for i in 0..k {
                for j in 0..k {
                    system[i][j] += centered[i] * centered[j];
                }
                system[i][k] += centered[i] * dy;
            }
        }

        let coefficients = solve(system, k);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        Ok(Self {
            feature_names: feature_names.to_vec(),
            coefficients,
            intercept,
        })
    }

    pub fn predict_one(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &FeatureMatrix) -> Vec<f64> {
        x.rows().iter().map(|row| self.predict_one(row)).collect()
    }
}

/// Gauss–Jordan elimination with partial pivoting on an augmented `k × (k + 1)` system.
/// Columns without a usable pivot are left free and set to 0.
fn solve(mut system: Vec<Vec<f64>>, k: usize) -> Vec<f64> {
    let scale = (0..k).map(|i| system[i][i].abs()).fold(0.0, f64::max);
    let tolerance = PIVOT_TOLERANCE * scale.max(f64::MIN_POSITIVE);

    let mut pivot_columns = Vec::with_capacity(k);
    let mut row = 0;
    for col in 0..k {
        if row == k {
            break;
        }
        let Some(best) = (row..k).max_by(|&a, &b| {
            system[a][col].abs().total_cmp(&system[b][col].abs())
        }) else {
            break;
        };
        if system[best][col].abs() <= tolerance {
            continue;
        }

        system.swap(row, best);
        let pivot = system[row][col];
        for value in system[row].iter_mut() {
            *value /= pivot;
        }
        let pivot_row = system[row].clone();
        for (r, other) in system.iter_mut().enumerate() {
            if r == row {
                continue;
            }
            let factor = other[col];
            if factor != 0.0 {
                for (value, p) in other.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
            }
        }
        pivot_columns.push(col);
        row += 1;
    }

    let mut coefficients = vec![0.0; k];
    for (r, &col) in pivot_columns.iter().enumerate() {
        coefficients[col] = system[r][k];
    }
    coefficients
}
