//! Advisory time series analysis core.
//!
//! Provides trend direction via linear regression, short-horizon forecasting
//! with widening confidence intervals, and z-score anomaly detection. Every
//! function is a pure computation over the borrowed input; results are
//! advisory and carry a plain-language explanation.

pub mod anomaly;
pub mod confidence;
pub mod error;
pub mod forecast;
pub mod format;
pub mod stats;
pub mod trend;

// Re-exports for convenience
pub use anomaly::{
    detect_anomalies, Anomaly, AnomalyOptions, AnomalyResult, Severity, DEFAULT_THRESHOLD,
};
pub use confidence::{confidence_score, FULL_CONFIDENCE_SAMPLES, MAX_CONFIDENCE};
pub use error::{AnalysisError, Operation, Result};
pub use forecast::{
    band_margin, forecast, moving_average_forecast, point_confidence, ForecastOptions,
    ForecastPoint, ForecastResult, ForecastStrategy, DEFAULT_HORIZON,
    DEFAULT_MOVING_AVERAGE_WINDOW, MIN_POINT_CONFIDENCE,
};
pub use stats::LinearFit;
pub use trend::{analyze_trend, TrendDirection, TrendResult};
