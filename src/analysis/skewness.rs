//! Skewness-driven choice of a variance-stabilising transform.

use crate::analysis::error::AnalysisError;
use crate::stats;
use serde::Serialize;
use std::fmt;

/// Skewness magnitude above which a column is transformed.
pub const SKEW_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransformationType {
    None,
    /// `ln(1 + x)`, for right-skewed non-negative data.
    Log,
    /// `exp(x / max)`, for left-skewed non-negative data.
    Exponential,
}

impl fmt::Display for TransformationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransformationType::None => "None",
            TransformationType::Log => "Log",
            TransformationType::Exponential => "Exponential",
        };
        write!(f, "{label}")
    }
}

/// Outcome of [`handle_skewness`] for one column. Built once and never changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkewTransformation {
    pub column: String,
    pub transformation: TransformationType,
    pub original: Vec<Option<f64>>,
    pub transformed: Vec<Option<f64>>,
    pub original_skewness: f64,
    pub transformed_skewness: f64,
}

/// Picks and applies a transform from the column's adjusted sample skewness γ:
///
/// * γ > 0.5 and min ≥ 0: `Log`
/// * γ < −0.5 and min ≥ 0: `Exponential`
/// * otherwise: `None` (identity)
///
/// The non-negativity guard also applies to left-skewed data, so a left-skewed column
/// with negative values (typical for winter temperatures) is left untransformed.
/// Absent values stay absent.
///
/// # Errors
///
/// Returns [`AnalysisError::InsufficientData`] for fewer than three present values,
/// where skewness is undefined.
pub fn handle_skewness(
    column: &str,
    values: &[Option<f64>],
) -> Result<SkewTransformation, AnalysisError> {
    let present = stats::present_values(values);
    if present.len() < 3 {
        return Err(AnalysisError::InsufficientData {
            operation: "skewness handling",
            needed: 3,
            found: present.len(),
        });
    }

    let original_skewness = stats::adjusted_skewness(&present);
    let min = stats::min(&present);
    let max = stats::max(&present);

    let transformation = if original_skewness > SKEW_THRESHOLD && min >= 0.0 {
        TransformationType::Log
    } else if original_skewness < -SKEW_THRESHOLD && min >= 0.0 {
        TransformationType::Exponential
    } else {
        TransformationType::None
    };

    let transformed: Vec<Option<f64>> = match transformation {
        TransformationType::Log => values.iter().map(|v| v.map(f64::ln_1p)).collect(),
        TransformationType::Exponential => {
            values.iter().map(|v| v.map(|x| (x / max).exp())).collect()
        }
        TransformationType::None => values.to_vec(),
    };

    let transformed_skewness = match transformation {
        TransformationType::None => original_skewness,
        _ => stats::adjusted_skewness(&stats::present_values(&transformed)),
    };

    Ok(SkewTransformation {
        column: column.to_string(),
        transformation,
        original: values.to_vec(),
        transformed,
        original_skewness,
        transformed_skewness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn right_skewed_positive_data_gets_log() {
        let result = handle_skewness("temperature", &some(&[1.0, 2.0, 3.0, 4.0, 100.0])).unwrap();
        assert_eq!(result.transformation, TransformationType::Log);
        assert!(result.original_skewness > SKEW_THRESHOLD);
        assert!(result.transformed_skewness.abs() <= result.original_skewness.abs());
        assert_relative_eq!(result.transformed[0].unwrap(), 2f64.ln());
    }

    #[test]
    fn left_skewed_non_negative_data_gets_exponential() {
        let result = handle_skewness("humidity", &some(&[1.0, 9.0, 10.0, 10.0, 10.0])).unwrap();
        assert_eq!(result.transformation, TransformationType::Exponential);
        assert!(result.original_skewness < -SKEW_THRESHOLD);
        assert_relative_eq!(result.transformed[4].unwrap(), 1f64.exp());
    }

    #[test]
    fn left_skewed_data_with_negatives_is_not_transformed() {
        // The non-negativity guard makes the exponential branch unreachable here even
        // though the skew is strongly negative.
        let values = some(&[-30.0, -1.0, 0.0, 1.0, 1.0, 2.0]);
        let result = handle_skewness("temperature", &values).unwrap();
        assert!(result.original_skewness < -SKEW_THRESHOLD);
        assert_eq!(result.transformation, TransformationType::None);
        assert_eq!(result.transformed, values);
        assert_eq!(result.transformed_skewness, result.original_skewness);
    }

    #[test]
    fn symmetric_data_is_left_alone_and_gaps_survive() {
        let values = vec![Some(1.0), None, Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        let result = handle_skewness("wind_speed", &values).unwrap();
        assert_eq!(result.transformation, TransformationType::None);
        assert_relative_eq!(result.original_skewness, 0.0, epsilon = 1e-12);
        assert_eq!(result.transformed[1], None);
    }

    #[test]
    fn too_few_values_is_an_error() {
        let err = handle_skewness("wind_speed", &[Some(1.0), None, Some(2.0)]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { needed: 3, found: 2, .. }));
    }

    #[test]
    fn labels_match_the_documented_names() {
        assert_eq!(TransformationType::Log.to_string(), "Log");
        assert_eq!(TransformationType::Exponential.to_string(), "Exponential");
        assert_eq!(TransformationType::None.to_string(), "None");
    }
}
