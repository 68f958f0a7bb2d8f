//! Numeric kernels shared by the analysis and forecast modules.
//!
//! All functions work on plain `f64` slices. Absent measurements are dropped by the
//! caller (see [`present_values`]) before anything in here is called.

use ordered_float::OrderedFloat;

/// Collects the present (non-absent) values of a column, in order.
pub fn present_values(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, averaging the two middle values for an even count. `NaN` for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1].0 + sorted[n / 2].0) / 2.0
    } else {
        sorted[n / 2].0
    }
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// k-th central moment around `center`, divided by n.
fn central_moment(values: &[f64], center: f64, k: i32) -> f64 {
    values.iter().map(|x| (x - center).powi(k)).sum::<f64>() / values.len() as f64
}

/// Population variance (ddof = 0).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    central_moment(values, mean(values), 2)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Sample standard deviation (ddof = 1). `NaN` for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Fisher-Pearson coefficient of skewness, g1 = m3 / m2^1.5 (biased).
///
/// A zero-variance input has no asymmetry and reports 0.
pub fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    central_moment(values, m, 3) / m2.powf(1.5)
}

/// Adjusted sample skewness, G1 = g1 * sqrt(n(n-1)) / (n-2). `NaN` for fewer than three values.
pub fn adjusted_skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return f64::NAN;
    }
    skewness(values) * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Excess kurtosis, g2 = m4 / m2^2 - 3 (biased). A normal distribution gives 0.
///
/// A zero-variance input reports 0.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 == 0.0 {
        return 0.0;
    }
    central_moment(values, m, 4) / (m2 * m2) - 3.0
}

/// Pearson correlation of two equally long slices.
///
/// `NaN` when fewer than two pairs exist or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return f64::NAN;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = mean(xs);
    let my = mean(ys);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Number of distinct values, comparing by total order.
pub fn distinct_count(values: &[f64]) -> usize {
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Complementary error function (Numerical Recipes `erfcc`, fractional error below 1.2e-7).
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Upper tail probability of the standard normal distribution, P(Z > z).
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(z: f64) -> f64 {
    1.0 - normal_sf(z)
}

/// Quantile function of the standard normal distribution (Acklam's rational approximation).
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moments_of_small_sample() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_relative_eq!(mean(&values), 22.0);
        assert_relative_eq!(median(&values), 3.0);
        assert_relative_eq!(population_std(&values), (1522.0f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(sample_std(&values), (1902.5f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(skewness(&values), 88920.0 / 1522f64.powf(1.5), epsilon = 1e-12);
        assert!(adjusted_skewness(&values) > skewness(&values));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn constant_input_has_zero_shape_statistics() {
        let values = [5.0; 8];
        assert_eq!(skewness(&values), 0.0);
        assert_eq!(excess_kurtosis(&values), 0.0);
        assert_eq!(population_std(&values), 0.0);
        assert!(pearson(&values, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).is_nan());
    }

    #[test]
    fn uniform_sample_has_negative_excess_kurtosis() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        assert_relative_eq!(excess_kurtosis(&values), -1.2, epsilon = 0.01);
    }

    #[test]
    fn pearson_detects_perfect_linear_relations() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson(&xs, &[2.0, 4.0, 6.0, 8.0]), 1.0);
        assert_relative_eq!(pearson(&xs, &[8.0, 6.0, 4.0, 2.0]), -1.0);
    }

    #[test]
    fn normal_distribution_helpers_agree() {
        assert_relative_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-7);
        assert_relative_eq!(normal_sf(1.959_963_985), 0.025, epsilon = 1e-6);
        assert_relative_eq!(normal_quantile(0.975), 1.959_963_985, epsilon = 1e-6);
        assert_relative_eq!(normal_quantile(0.01), -2.326_347_874, epsilon = 1e-6);
        for p in [0.001, 0.2, 0.5, 0.7, 0.999] {
            assert_relative_eq!(normal_cdf(normal_quantile(p)), p, epsilon = 1e-6);
        }
    }

    #[test]
    fn rounding_and_distinct_values() {
        assert_eq!(round_to(2.345_67, 2), 2.35);
        assert_eq!(round_to(-1.005_1, 2), -1.01);
        assert_eq!(distinct_count(&[1.0, 1.0, 2.0, 3.0, 3.0]), 3);
    }
}
