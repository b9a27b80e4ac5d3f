//! Shared numeric helpers: moments, the index-axis linear fit, rounding.

use statrs::statistics::Statistics;

use crate::error::{Operation, Result};

/// Arithmetic mean. NaN for an empty slice.
///
/// Plain sum over count, so series symmetric around zero have a mean of
/// exactly zero.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n, not n - 1).
pub fn population_std_dev(values: &[f64]) -> f64 {
    values.iter().population_std_dev()
}

/// Check if every value is bit-identical to the first.
///
/// Summing a repeated non-representable value (e.g. 0.1) drifts, so a
/// constant series can report a tiny non-zero standard deviation. Callers
/// use this to recognize zero variance exactly.
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v.to_bits() == first.to_bits()),
        None => true,
    }
}

/// Round to a fixed number of decimal places.
///
/// Rounds the exact decimal value of `value`, with ties to even, so
/// `0.125` becomes `0.12` and `2.675` (stored as 2.67499...) becomes `2.67`.
/// Non-finite values pass through.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Reject NaN and infinite inputs with the operation's failure error.
pub fn ensure_finite(values: &[f64], operation: Operation) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(operation.failure(format!(
            "non-finite value {} at index {}",
            values[idx], idx
        ))),
        None => Ok(()),
    }
}

/// Ordinary least squares line fitted against the index axis `0..n-1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Squared correlation coefficient, in [0, 1]
    pub r_squared: f64,
    /// Number of observations the line was fitted on
    pub n: usize,
}

impl LinearFit {
    /// Fit `values` against their positions.
    ///
    /// A constant series has an undefined correlation; it is reported as a
    /// flat line through the value with `r_squared = 0`. Failures are
    /// attributed to `operation`.
    pub fn over_index(values: &[f64], operation: Operation) -> Result<LinearFit> {
        let n = values.len();
        if n < 2 {
            return Err(operation.failure(format!(
                "a linear fit needs at least 2 observations, got {}",
                n
            )));
        }

        if is_constant(values) {
            return Ok(LinearFit {
                slope: 0.0,
                intercept: values[0],
                r_squared: 0.0,
                n,
            });
        }

        let x_mean = (n as f64 - 1.0) / 2.0;
        let y_mean = mean(values);

        let mut ss_xy = 0.0;
        let mut ss_xx = 0.0;
        let mut ss_yy = 0.0;

        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            let dy = y - y_mean;
            ss_xy += dx * dy;
            ss_xx += dx * dx;
            ss_yy += dy * dy;
        }

        let slope = ss_xy / ss_xx;
        let intercept = y_mean - slope * x_mean;
        let r_squared = if ss_yy > 0.0 {
            (ss_xy * ss_xy / (ss_xx * ss_yy)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        if !slope.is_finite() || !intercept.is_finite() || !r_squared.is_finite() {
            return Err(operation.failure(format!(
                "linear fit is not finite (slope={}, intercept={})",
                slope, intercept
            )));
        }

        Ok(LinearFit {
            slope,
            intercept,
            r_squared,
            n,
        })
    }

    /// Value of the fitted line at position `x`.
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Actual minus fitted value at every historical position.
    pub fn residuals(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &y)| y - self.predict(i as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0, epsilon = 1e-12);
        assert_relative_eq!(population_std_dev(&values), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_is_constant() {
        assert!(is_constant(&[0.1; 12]));
        assert!(is_constant(&[]));
        assert!(!is_constant(&[1.0, 1.0, 1.0000001]));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(-2.005001, 2), -2.01);
        assert_eq!(round_to(7.0, 2), 7.0);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_round_to_uses_exact_decimal_value() {
        // Exact ties go to the even digit
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(1.125, 2), 1.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        // 2.675 is stored just below the tie
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(-0.125, 2), -0.12);
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[1.0, 2.0], Operation::Trend).is_ok());
        let err = ensure_finite(&[1.0, f64::NAN], Operation::Trend).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Trend analysis failed: non-finite value NaN at index 1"
        );
        let err = ensure_finite(&[f64::INFINITY], Operation::Anomaly).unwrap_err();
        assert!(matches!(err, AnalysisError::AnomalyDetection(_)));
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = LinearFit::over_index(&values, Operation::Trend).unwrap();
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.predict(10.0), 23.0, epsilon = 1e-12);
        for r in fit.residuals(&values) {
            assert_relative_eq!(r, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_linear_fit_noisy() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let fit = LinearFit::over_index(&values, Operation::Trend).unwrap();
        // x_mean = 2, y_mean = 3, ss_xy = 8, ss_xx = 10, ss_yy = 10
        assert_relative_eq!(fit.slope, 0.8, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.4, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared, 0.64, epsilon = 1e-12);
        let residual_sum: f64 = fit.residuals(&values).iter().sum();
        assert_relative_eq!(residual_sum, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_linear_fit_constant_series() {
        let fit = LinearFit::over_index(&[5.0; 30], Operation::Trend).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 5.0);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn test_linear_fit_needs_two_points() {
        assert_eq!(
            LinearFit::over_index(&[1.0], Operation::Forecast).unwrap_err(),
            AnalysisError::Forecasting("a linear fit needs at least 2 observations, got 1".into())
        );
    }

    #[test]
    fn test_linear_fit_overflow_is_an_error() {
        let values = [f64::MAX, f64::MAX, 0.0];
        let err = LinearFit::over_index(&values, Operation::Trend).unwrap_err();
        assert!(matches!(err, AnalysisError::TrendAnalysis(_)));
        assert!(err
            .to_string()
            .starts_with("Trend analysis failed: linear fit is not finite"));
    }
}
