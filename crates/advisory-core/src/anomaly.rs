//! Z-score anomaly detection with severity classification.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Operation, Result};
use crate::format::display_number;
use crate::stats::{ensure_finite, is_constant, mean, population_std_dev, round_to};

/// Z-score threshold applied when the caller does not say.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Severity of a flagged observation, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify an absolute z-score.
    ///
    /// critical: z >= 4.0, high: z >= 3.5, medium: z >= 3.0, low otherwise.
    pub fn from_z_score(z: f64) -> Self {
        if z >= 4.0 {
            Severity::Critical
        } else if z >= 3.5 {
            Severity::High
        } else if z >= 3.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Anomaly detection options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnomalyOptions {
    /// Minimum absolute z-score that flags an observation
    pub threshold: f64,
}

impl Default for AnomalyOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// A flagged observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// 0-based position in the input series
    pub index: usize,
    pub value: f64,
    /// Series mean
    pub expected_value: f64,
    /// Percent deviation from the mean; `None` when the mean is zero
    pub deviation: Option<f64>,
    /// Absolute z-score
    pub z_score: f64,
    pub severity: Severity,
    pub timestamp: Option<String>,
}

/// Anomaly detection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyResult {
    /// Metric name echoed from the request
    pub metric_name: String,
    /// Flagged observations in ascending index order
    pub anomalies: Vec<Anomaly>,
    pub total_anomalies: usize,
    /// Plain-language summary
    pub explanation: String,
}

/// Detect observations whose z-score reaches the threshold.
///
/// The caller guarantees at least ten observations and a threshold in
/// [1, 5]. A series with zero variance yields no anomalies.
///
/// # Arguments
/// * `metric_name` - Name used verbatim in the explanation
/// * `values` - Observations in time order
/// * `timestamps` - Optional labels; an index past their end gets no label
/// * `options` - Detection threshold
pub fn detect_anomalies(
    metric_name: &str,
    values: &[f64],
    timestamps: Option<&[String]>,
    options: &AnomalyOptions,
) -> Result<AnomalyResult> {
    debug!(
        metric = metric_name,
        n = values.len(),
        threshold = options.threshold,
        "detecting anomalies"
    );

    let result = compute_anomalies(metric_name, values, timestamps, options.threshold);
    match result {
        Ok(ref r) => debug!(
            metric = metric_name,
            total = r.total_anomalies,
            "anomaly detection finished"
        ),
        Err(ref e) => warn!(metric = metric_name, error = %e, "anomaly detection failed"),
    }
    result
}

fn compute_anomalies(
    metric_name: &str,
    values: &[f64],
    timestamps: Option<&[String]>,
    threshold: f64,
) -> Result<AnomalyResult> {
    ensure_finite(values, Operation::Anomaly)?;

    let mean = mean(values);
    let std_dev = population_std_dev(values);

    if !mean.is_finite() || !std_dev.is_finite() {
        return Err(Operation::Anomaly.failure(format!(
            "series moments are not finite (mean={}, std={})",
            mean, std_dev
        )));
    }

    if std_dev == 0.0 || is_constant(values) {
        return Ok(AnomalyResult {
            metric_name: metric_name.to_string(),
            anomalies: vec![],
            total_anomalies: 0,
            explanation: format!(
                "No anomalies detected. The {} data shows zero variance (all values are identical).",
                metric_name
            ),
        });
    }

    let anomalies: Vec<Anomaly> = values
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z = (value - mean).abs() / std_dev;
            if z < threshold {
                return None;
            }

            let deviation = if mean != 0.0 {
                Some(round_to((value - mean) / mean * 100.0, 2))
            } else {
                None
            };

            Some(Anomaly {
                index,
                value: round_to(value, 2),
                expected_value: round_to(mean, 2),
                deviation,
                z_score: round_to(z, 2),
                severity: Severity::from_z_score(z),
                timestamp: timestamps.and_then(|ts| ts.get(index).cloned()),
            })
        })
        .collect();

    let explanation = explain(metric_name, anomalies.len(), threshold);

    Ok(AnomalyResult {
        metric_name: metric_name.to_string(),
        total_anomalies: anomalies.len(),
        anomalies,
        explanation,
    })
}

fn explain(metric_name: &str, count: usize, threshold: f64) -> String {
    let threshold = display_number(threshold);
    if count == 0 {
        return format!(
            "No significant anomalies detected in {}. All data points fall within {} standard \
             deviations of the mean.",
            metric_name, threshold
        );
    }

    let noun = if count == 1 { "anomaly" } else { "anomalies" };
    format!(
        "Detected {} {} in {} using a Z-score threshold of {}. \
         These data points deviate significantly from the expected pattern and require investigation.",
        count, noun, metric_name, threshold
    )
}
