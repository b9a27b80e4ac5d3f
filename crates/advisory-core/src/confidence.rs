//! Confidence scoring shared by trend analysis and forecasting.
//!
//! A perfect fit on a handful of points should not read as near-certain, so
//! the goodness of fit is discounted linearly until
//! [`FULL_CONFIDENCE_SAMPLES`] observations are available.

use crate::stats::round_to;

/// Sample size at which the size discount saturates.
pub const FULL_CONFIDENCE_SAMPLES: usize = 30;

/// Upper bound of any reported confidence percentage.
pub const MAX_CONFIDENCE: f64 = 99.9;

/// Convert a goodness-of-fit statistic and sample size into a percentage.
///
/// # Arguments
/// * `r_squared` - Fraction of variance explained, expected in [0, 1]
/// * `n` - Number of observations the fit used
///
/// # Returns
/// A percentage in [0, 99.9], rounded to 2 decimals.
///
/// # Formula
/// confidence = r² * min(1, n/30) * 100
///
/// # Example
/// ```
/// use advisory_core::confidence::confidence_score;
/// assert_eq!(confidence_score(1.0, 30), 99.9);
/// assert_eq!(confidence_score(0.5, 15), 25.0);
/// ```
pub fn confidence_score(r_squared: f64, n: usize) -> f64 {
    let r_squared = if r_squared.is_nan() {
        0.0
    } else {
        r_squared.clamp(0.0, 1.0)
    };
    let size_factor = (n as f64 / FULL_CONFIDENCE_SAMPLES as f64).min(1.0);
    let confidence = (r_squared * size_factor * 100.0).clamp(0.0, MAX_CONFIDENCE);
    round_to(confidence, 2)
}
