//! Trend direction analysis by linear regression over the index axis.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::confidence::confidence_score;
use crate::error::{Operation, Result};
use crate::format::display_number;
use crate::stats::{ensure_finite, population_std_dev, round_to, LinearFit};

/// Slopes smaller than this fraction of the series' standard deviation are
/// treated as no trend.
pub const STABLE_SLOPE_RATIO: f64 = 0.01;

/// Direction of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

impl TrendDirection {
    /// Classify a slope against the series' spread.
    pub fn classify(slope: f64, std_dev: f64) -> Self {
        if std_dev == 0.0 || slope.abs() < std_dev * STABLE_SLOPE_RATIO {
            TrendDirection::Stable
        } else if slope > 0.0 {
            TrendDirection::Upward
        } else {
            TrendDirection::Downward
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrendDirection::Upward => "upward",
            TrendDirection::Downward => "downward",
            TrendDirection::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Trend analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    /// Metric name echoed from the request
    pub metric_name: String,
    /// Classified direction
    pub trend_direction: TrendDirection,
    /// Slope per period, rounded to 4 decimals
    pub slope: f64,
    /// Confidence percentage (0-99.9)
    pub confidence: f64,
    /// Number of observations fitted
    pub data_points_analyzed: usize,
    /// Plain-language summary
    pub explanation: String,
    /// First timestamp label, if labels were supplied
    pub period_start: Option<String>,
    /// Last timestamp label, if labels were supplied
    pub period_end: Option<String>,
}

/// Analyze a series for a linear trend.
///
/// The caller guarantees at least two observations.
///
/// # Arguments
/// * `metric_name` - Name used verbatim in the explanation
/// * `values` - Observations in time order
/// * `timestamps` - Optional labels parallel to `values`
pub fn analyze_trend(
    metric_name: &str,
    values: &[f64],
    timestamps: Option<&[String]>,
) -> Result<TrendResult> {
    debug!(metric = metric_name, n = values.len(), "analyzing trend");

    let result = compute_trend(metric_name, values, timestamps);
    if let Err(ref e) = result {
        warn!(metric = metric_name, error = %e, "trend analysis failed");
    }
    result
}

fn compute_trend(
    metric_name: &str,
    values: &[f64],
    timestamps: Option<&[String]>,
) -> Result<TrendResult> {
    ensure_finite(values, Operation::Trend)?;

    let fit = LinearFit::over_index(values, Operation::Trend)?;
    let std_dev = population_std_dev(values);
    let direction = TrendDirection::classify(fit.slope, std_dev);
    let confidence = confidence_score(fit.r_squared, fit.n);

    let explanation = explain(metric_name, direction, fit.slope, confidence);

    let (period_start, period_end) = match timestamps {
        Some(ts) => (ts.first().cloned(), ts.last().cloned()),
        None => (None, None),
    };

    debug!(
        metric = metric_name,
        direction = direction.name(),
        slope = fit.slope,
        r_squared = fit.r_squared,
        confidence,
        "trend analyzed"
    );

    Ok(TrendResult {
        metric_name: metric_name.to_string(),
        trend_direction: direction,
        slope: round_to(fit.slope, 4),
        confidence,
        data_points_analyzed: values.len(),
        explanation,
        period_start,
        period_end,
    })
}

fn explain(metric_name: &str, direction: TrendDirection, slope: f64, confidence: f64) -> String {
    let confidence = display_number(confidence);
    match direction {
        TrendDirection::Stable => format!(
            "The {} shows a stable trend with minimal variation over the analyzed period. \
             The data points remain relatively consistent with {}% confidence.",
            metric_name, confidence
        ),
        TrendDirection::Upward => format!(
            "The {} demonstrates an upward trend with a slope of {:.4}. \
             This indicates consistent growth over the analyzed period with {}% confidence.",
            metric_name, slope, confidence
        ),
        TrendDirection::Downward => format!(
            "The {} shows a downward trend with a slope of {:.4}. \
             This indicates a declining pattern over the analyzed period with {}% confidence.",
            metric_name, slope, confidence
        ),
    }
}
