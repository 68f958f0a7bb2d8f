//! Shapiro–Wilk normality test (Royston 1995, algorithm AS R94).

use crate::analysis::error::AnalysisError;
use crate::stats;
use log::warn;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::f64::consts::PI;

/// Significance level used by [`NormalityTest::is_normal`].
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Above this sample size the p-value approximation is no longer validated.
pub const MAX_RELIABLE_SAMPLE: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalityTest {
    /// W statistic in `(0, 1]`.
    pub statistic: f64,
    pub p_value: f64,
    /// `p_value > alpha`.
    pub is_normal: bool,
}

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Half of the antisymmetric Shapiro–Wilk weights, largest first.
///
/// The weights for the lower half of the sorted sample are these values negated.
fn coefficients(n: usize) -> Vec<f64> {
    const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
    const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];

    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let an = n as f64;
    let m: Vec<f64> = (0..half)
        .map(|i| -stats::normal_quantile((i as f64 + 1.0 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let mut a = vec![0.0; half];
    a[0] = poly(&C1, rsn) + m[0] / ssumm2;

    let (first_scaled, fac) = if n > 5 {
        a[1] = poly(&C2, rsn) + m[1] / ssumm2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a[0].powi(2) - 2.0 * a[1].powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a[0].powi(2))).sqrt();
        (1, fac)
    };

    for (ai, mi) in a.iter_mut().zip(&m).skip(first_scaled) {
        *ai = mi / fac;
    }
    a
}

/// Shapiro–Wilk W statistic and p-value for a sample.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] for fewer than three values or a sample whose
/// values are all identical.
pub fn shapiro_wilk(sample: &[f64]) -> Result<(f64, f64), AnalysisError> {
    let n = sample.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData {
            operation: "Shapiro-Wilk test",
            needed: 3,
            found: n,
        });
    }
    if n > MAX_RELIABLE_SAMPLE {
        warn!("Shapiro-Wilk p-value may be inaccurate for n = {n} > {MAX_RELIABLE_SAMPLE}");
    }

    let mut x: Vec<f64> = sample.to_vec();
    x.sort_unstable_by_key(|v| OrderedFloat(*v));
    if x[n - 1] - x[0] <= 0.0 {
        return Err(AnalysisError::InsufficientData {
            operation: "Shapiro-Wilk test (distinct values)",
            needed: 2,
            found: 1,
        });
    }

    let a = coefficients(n);
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let mean = stats::mean(&x);
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let w = (numerator * numerator / ss).min(1.0);

    Ok((w, p_value(w, n)))
}

fn p_value(w: f64, n: usize) -> f64 {
    const G: [f64; 2] = [-2.273, 0.459];
    const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
    const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
    const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];

    if n == 3 {
        let p = (6.0 / PI) * (w.sqrt().asin() - PI / 3.0);
        return p.clamp(0.0, 1.0);
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 1e-99;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    stats::normal_sf((y - m) / s)
}

/// Runs [`shapiro_wilk`] over the present values of a column.
pub fn test_normality(values: &[Option<f64>], alpha: f64) -> Result<NormalityTest, AnalysisError> {
    let (statistic, p_value) = shapiro_wilk(&stats::present_values(values))?;
    Ok(NormalityTest {
        statistic,
        p_value,
        is_normal: p_value > alpha,
    })
}
