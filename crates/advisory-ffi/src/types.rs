//! C-compatible type definitions for the FFI boundary.
//!
//! Array and string members of result structs are allocated with `malloc`
//! and released by the matching `advisory_free_*` function.

use advisory_core::{AnalysisError, ForecastStrategy, Severity, TrendDirection};
use libc::{c_char, c_double, c_int, size_t};

/// Error codes for FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    InvalidInput = 2,
    ComputationError = 3,
    AllocationError = 4,
    InsufficientData = 5,
    InvalidParameter = 6,
    PanicCaught = 7,
}

impl From<&AnalysisError> for ErrorCode {
    fn from(err: &AnalysisError) -> Self {
        match err.to_code() {
            2 => ErrorCode::InvalidInput,
            5 => ErrorCode::InsufficientData,
            6 => ErrorCode::InvalidParameter,
            _ => ErrorCode::ComputationError,
        }
    }
}

/// Error structure with message buffer for FFI.
#[repr(C)]
pub struct AdvisoryError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl AdvisoryError {
    /// Create a success error (no error).
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    /// Set an error with code and message.
    pub fn set_error(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0; // Null terminator
    }

    /// Message as a Rust string, up to the first NUL.
    pub fn message_str(&self) -> String {
        let bytes: Vec<u8> = self
            .message
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Default for AdvisoryError {
    fn default() -> Self {
        Self::success()
    }
}

/// Trend direction codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirectionCode {
    Upward = 0,
    Downward = 1,
    Stable = 2,
}

impl From<TrendDirection> for TrendDirectionCode {
    fn from(direction: TrendDirection) -> Self {
        match direction {
            TrendDirection::Upward => TrendDirectionCode::Upward,
            TrendDirection::Downward => TrendDirectionCode::Downward,
            TrendDirection::Stable => TrendDirectionCode::Stable,
        }
    }
}

/// Severity codes, ordered from least to most severe.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityCode {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl From<Severity> for SeverityCode {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => SeverityCode::Low,
            Severity::Medium => SeverityCode::Medium,
            Severity::High => SeverityCode::High,
            Severity::Critical => SeverityCode::Critical,
        }
    }
}

/// Trend analysis result.
#[repr(C)]
pub struct TrendResult {
    pub direction: TrendDirectionCode,
    /// Slope per period (4 decimals)
    pub slope: c_double,
    /// Confidence percentage (0-99.9)
    pub confidence: c_double,
    pub data_points_analyzed: size_t,
    /// NUL-terminated explanation
    pub explanation: *mut c_char,
    /// First timestamp label, null when none were supplied
    pub period_start: *mut c_char,
    /// Last timestamp label, null when none were supplied
    pub period_end: *mut c_char,
}

impl Default for TrendResult {
    fn default() -> Self {
        Self {
            direction: TrendDirectionCode::Stable,
            slope: f64::NAN,
            confidence: f64::NAN,
            data_points_analyzed: 0,
            explanation: std::ptr::null_mut(),
            period_start: std::ptr::null_mut(),
            period_end: std::ptr::null_mut(),
        }
    }
}

/// Forecasting strategy codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastStrategyCode {
    LinearRegression = 0,
    MovingAverage = 1,
}

/// Forecast options.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForecastOptions {
    /// Number of periods to forecast (1-365)
    pub horizon: c_int,
    /// A `ForecastStrategyCode` value
    pub strategy: c_int,
    /// Moving-average window (0 or negative = default)
    pub window: c_int,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon: advisory_core::DEFAULT_HORIZON as c_int,
            strategy: ForecastStrategyCode::LinearRegression as c_int,
            window: 0,
        }
    }
}

impl ForecastOptions {
    /// Core strategy selected by these options. Unknown codes are rejected.
    pub fn core_strategy(&self) -> advisory_core::Result<ForecastStrategy> {
        const LINEAR: c_int = ForecastStrategyCode::LinearRegression as c_int;
        const MOVING_AVERAGE: c_int = ForecastStrategyCode::MovingAverage as c_int;
        match self.strategy {
            LINEAR => Ok(ForecastStrategy::LinearRegression),
            MOVING_AVERAGE => Ok(ForecastStrategy::MovingAverage {
                window: crate::conversion::to_option_usize(self.window)
                    .unwrap_or(advisory_core::DEFAULT_MOVING_AVERAGE_WINDOW),
            }),
            other => Err(AnalysisError::InvalidParameter {
                param: "strategy".to_string(),
                value: other.to_string(),
                reason: "must be 0 (linear regression) or 1 (moving average)".to_string(),
            }),
        }
    }
}

/// Forecast result.
#[repr(C)]
pub struct ForecastResult {
    /// Point forecasts array
    pub predicted_values: *mut c_double,
    /// Lower confidence bounds
    pub lower_bounds: *mut c_double,
    /// Upper confidence bounds
    pub upper_bounds: *mut c_double,
    /// Per-period confidence
    pub confidences: *mut c_double,
    /// Number of forecast points
    pub n_forecasts: size_t,
    /// Model name
    pub model_name: [c_char; 64],
    /// Overall confidence
    pub confidence: c_double,
    /// NUL-terminated explanation
    pub explanation: *mut c_char,
}

impl Default for ForecastResult {
    fn default() -> Self {
        Self {
            predicted_values: std::ptr::null_mut(),
            lower_bounds: std::ptr::null_mut(),
            upper_bounds: std::ptr::null_mut(),
            confidences: std::ptr::null_mut(),
            n_forecasts: 0,
            model_name: [0; 64],
            confidence: f64::NAN,
            explanation: std::ptr::null_mut(),
        }
    }
}

/// Anomaly detection options.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AnomalyOptions {
    /// Z-score threshold (1-5)
    pub threshold: c_double,
}

impl Default for AnomalyOptions {
    fn default() -> Self {
        Self {
            threshold: advisory_core::DEFAULT_THRESHOLD,
        }
    }
}

/// Anomaly detection result. Parallel arrays of length `n_anomalies`.
#[repr(C)]
pub struct AnomalyResult {
    pub indices: *mut size_t,
    pub values: *mut c_double,
    pub expected_values: *mut c_double,
    /// Percent deviation; NaN where the series mean is zero
    pub deviations: *mut c_double,
    pub z_scores: *mut c_double,
    pub severities: *mut c_int,
    pub n_anomalies: size_t,
    /// NUL-terminated explanation
    pub explanation: *mut c_char,
}

impl Default for AnomalyResult {
    fn default() -> Self {
        Self {
            indices: std::ptr::null_mut(),
            values: std::ptr::null_mut(),
            expected_values: std::ptr::null_mut(),
            deviations: std::ptr::null_mut(),
            z_scores: std::ptr::null_mut(),
            severities: std::ptr::null_mut(),
            n_anomalies: 0,
            explanation: std::ptr::null_mut(),
        }
    }
}
