//! Short-horizon forecasting with widening uncertainty bands.
//!
//! The default strategy extrapolates the least-squares line fitted over the
//! history. A trailing moving average is available as an alternate strategy.
//! Neither models seasonality or autocorrelation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::confidence::confidence_score;
use crate::error::{Operation, Result};
use crate::format::display_number;
use crate::stats::{ensure_finite, mean, population_std_dev, round_to, LinearFit};

/// Width of the band in residual standard deviations (~95% under normality).
pub const BAND_WIDTH_SIGMAS: f64 = 2.0;

/// Relative band growth per forecast period.
pub const BAND_GROWTH_PER_PERIOD: f64 = 0.05;

/// Confidence lost per forecast period.
pub const CONFIDENCE_DECAY_PER_PERIOD: f64 = 0.5;

/// Per-point confidence never drops below this.
pub const MIN_POINT_CONFIDENCE: f64 = 50.0;

/// Trailing window of the moving-average strategy.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;

/// Number of periods forecast when the caller does not say.
pub const DEFAULT_HORIZON: usize = 30;

const LINEAR_MODEL_NAME: &str = "Linear Regression with Confidence Intervals";

/// Forecasting strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForecastStrategy {
    /// Extrapolate the OLS line fitted over the history
    #[default]
    LinearRegression,
    /// Recursively extend the trailing-window mean
    MovingAverage {
        #[serde(default = "default_window")]
        window: usize,
    },
}

fn default_window() -> usize {
    DEFAULT_MOVING_AVERAGE_WINDOW
}

impl ForecastStrategy {
    /// Descriptive model label reported with the result.
    pub fn model_name(&self) -> String {
        match self {
            ForecastStrategy::LinearRegression => LINEAR_MODEL_NAME.to_string(),
            ForecastStrategy::MovingAverage { window } => {
                format!("Simple Moving Average (window {})", (*window).max(1))
            }
        }
    }
}

/// Forecast options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastOptions {
    /// Number of future periods to produce
    pub horizon: usize,
    /// How future values are extrapolated
    pub strategy: ForecastStrategy,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            strategy: ForecastStrategy::default(),
        }
    }
}

/// A single forecast period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// 1-based period offset after the last observation
    pub period: usize,
    pub predicted_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Confidence percentage for this period
    pub confidence: f64,
}

/// Forecast result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Metric name echoed from the request
    pub metric_name: String,
    /// One point per forecast period, in period order
    pub forecasts: Vec<ForecastPoint>,
    /// Model label
    pub model_used: String,
    /// Confidence of the underlying fit (0-99.9)
    pub confidence: f64,
    /// Plain-language summary
    pub explanation: String,
}

/// Half-width of the uncertainty band at forecast period `period`.
///
/// margin = 2σ * (1 + 0.05 * period)
#[inline]
pub fn band_margin(sigma: f64, period: usize) -> f64 {
    BAND_WIDTH_SIGMAS * sigma * (1.0 + BAND_GROWTH_PER_PERIOD * period as f64)
}

/// Confidence reported for forecast period `period`, given the overall score.
#[inline]
pub fn point_confidence(overall: f64, period: usize) -> f64 {
    round_to(
        (overall - CONFIDENCE_DECAY_PER_PERIOD * period as f64).max(MIN_POINT_CONFIDENCE),
        2,
    )
}

/// Moving-average extrapolation.
///
/// Each forecast is the mean of the trailing `window` values of the history
/// extended with the forecasts produced so far. While fewer than `window`
/// values exist, the mean of all of them is used. A window of 0 behaves as 1.
/// An empty history yields no forecasts.
///
/// # Example
/// ```
/// use advisory_core::forecast::moving_average_forecast;
/// let f = moving_average_forecast(&[1.0, 2.0, 3.0], 1, 2);
/// assert_eq!(f, vec![2.5]);
/// ```
pub fn moving_average_forecast(values: &[f64], periods: usize, window: usize) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }

    let window = window.max(1);
    let mut history = values.to_vec();
    history.reserve(periods);
    let mut forecasts = Vec::with_capacity(periods);

    for _ in 0..periods {
        let start = history.len().saturating_sub(window);
        let next = mean(&history[start..]);
        forecasts.push(next);
        history.push(next);
    }

    forecasts
}

/// Generate a forecast for a series.
///
/// The caller guarantees at least five observations and a horizon in 1..=365.
pub fn forecast(
    metric_name: &str,
    values: &[f64],
    options: &ForecastOptions,
) -> Result<ForecastResult> {
    debug!(
        metric = metric_name,
        n = values.len(),
        horizon = options.horizon,
        strategy = ?options.strategy,
        "forecasting"
    );

    let result = match options.strategy {
        ForecastStrategy::LinearRegression => forecast_linear(metric_name, values, options.horizon),
        ForecastStrategy::MovingAverage { window } => {
            forecast_moving_average(metric_name, values, options.horizon, window)
        }
    };

    if let Err(ref e) = result {
        warn!(metric = metric_name, error = %e, "forecasting failed");
    }
    result
}

fn forecast_linear(metric_name: &str, values: &[f64], horizon: usize) -> Result<ForecastResult> {
    ensure_finite(values, Operation::Forecast)?;

    let n = values.len();
    let fit = LinearFit::over_index(values, Operation::Forecast)?;
    let sigma = population_std_dev(&fit.residuals(values));
    let overall = confidence_score(fit.r_squared, n);

    let predictions: Vec<f64> = (1..=horizon)
        .map(|i| fit.predict((n + i - 1) as f64))
        .collect();
    let forecasts = build_points(&predictions, sigma, overall)?;

    debug!(
        metric = metric_name,
        slope = fit.slope,
        sigma,
        confidence = overall,
        "linear forecast generated"
    );

    Ok(ForecastResult {
        metric_name: metric_name.to_string(),
        forecasts,
        model_used: LINEAR_MODEL_NAME.to_string(),
        confidence: overall,
        explanation: format!(
            "Forecast generated using linear regression based on {} historical data points. \
             The model shows {}% confidence in near-term predictions. \
             Confidence intervals widen for longer-term forecasts due to increasing uncertainty.",
            n,
            display_number(overall)
        ),
    })
}

fn forecast_moving_average(
    metric_name: &str,
    values: &[f64],
    horizon: usize,
    window: usize,
) -> Result<ForecastResult> {
    ensure_finite(values, Operation::Forecast)?;

    let n = values.len();
    if n < 2 {
        return Err(Operation::Forecast.failure(format!(
            "moving average needs at least 2 observations, got {}",
            n
        )));
    }

    let window = window.max(1);
    let (sigma, r_squared) = one_step_fit(values, window);
    let overall = confidence_score(r_squared, n);

    let predictions = moving_average_forecast(values, horizon, window);
    let forecasts = build_points(&predictions, sigma, overall)?;

    debug!(
        metric = metric_name,
        window,
        sigma,
        confidence = overall,
        "moving average forecast generated"
    );

    Ok(ForecastResult {
        metric_name: metric_name.to_string(),
        forecasts,
        model_used: ForecastStrategy::MovingAverage { window }.model_name(),
        confidence: overall,
        explanation: format!(
            "Forecast generated using a {}-period simple moving average based on {} historical \
             data points. The model shows {}% confidence in near-term predictions. \
             Confidence intervals widen for longer-term forecasts due to increasing uncertainty.",
            window,
            n,
            display_number(overall)
        ),
    })
}

/// In-sample one-step errors of the trailing-window mean.
///
/// Returns (population std of the errors, R² of the one-step predictions).
fn one_step_fit(values: &[f64], window: usize) -> (f64, f64) {
    let targets = &values[1..];
    let errors: Vec<f64> = (1..values.len())
        .map(|t| values[t] - mean(&values[t.saturating_sub(window)..t]))
        .collect();

    let sigma = population_std_dev(&errors);

    let target_mean = mean(targets);
    let sst: f64 = targets.iter().map(|v| (v - target_mean).powi(2)).sum();
    let sse: f64 = errors.iter().map(|e| e * e).sum();
    let r_squared = if sst > 0.0 {
        (1.0 - sse / sst).clamp(0.0, 1.0)
    } else {
        0.0
    };

    (sigma, r_squared)
}

fn build_points(predictions: &[f64], sigma: f64, overall: f64) -> Result<Vec<ForecastPoint>> {
    predictions
        .iter()
        .enumerate()
        .map(|(idx, &predicted)| {
            let period = idx + 1;
            let margin = band_margin(sigma, period);
            let lower = predicted - margin;
            let upper = predicted + margin;

            if !lower.is_finite() || !upper.is_finite() {
                return Err(Operation::Forecast.failure(format!(
                    "non-finite forecast at period {}",
                    period
                )));
            }

            Ok(ForecastPoint {
                period,
                predicted_value: round_to(predicted, 2),
                lower_bound: round_to(lower, 2),
                upper_bound: round_to(upper, 2),
                confidence: point_confidence(overall, period),
            })
        })
        .collect()
}
