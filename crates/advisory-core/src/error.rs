//! Error types for the analysis core.

use thiserror::Error;

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for analysis operations.
///
/// The first three variants are computation failures raised by the analysis
/// functions themselves. The remaining variants describe input contract
/// violations and are only produced by callers that validate requests before
/// handing them to the core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Trend analysis failed: {0}")]
    TrendAnalysis(String),

    #[error("Forecasting failed: {0}")]
    Forecasting(String),

    #[error("Anomaly detection failed: {0}")]
    AnomalyDetection(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },
}

impl AnalysisError {
    /// Stable error code, shared with the FFI `ErrorCode` table.
    ///
    /// 2 = invalid input, 3 = computation failure, 5 = insufficient data,
    /// 6 = invalid parameter.
    pub fn to_code(&self) -> i32 {
        match self {
            AnalysisError::InvalidInput(_) => 2,
            AnalysisError::TrendAnalysis(_)
            | AnalysisError::Forecasting(_)
            | AnalysisError::AnomalyDetection(_) => 3,
            AnalysisError::InsufficientData { .. } => 5,
            AnalysisError::InvalidParameter { .. } => 6,
        }
    }
}

/// The analysis operation an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Trend,
    Forecast,
    Anomaly,
}

impl Operation {
    /// Wrap a cause into this operation's computation failure.
    pub fn failure(self, cause: impl Into<String>) -> AnalysisError {
        let cause = cause.into();
        match self {
            Operation::Trend => AnalysisError::TrendAnalysis(cause),
            Operation::Forecast => AnalysisError::Forecasting(cause),
            Operation::Anomaly => AnalysisError::AnomalyDetection(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(AnalysisError::InvalidInput("test".into()).to_code(), 2);
        // Computation failures share one code
        assert_eq!(AnalysisError::TrendAnalysis("test".into()).to_code(), 3);
        assert_eq!(AnalysisError::Forecasting("test".into()).to_code(), 3);
        assert_eq!(AnalysisError::AnomalyDetection("test".into()).to_code(), 3);
        assert_eq!(
            AnalysisError::InsufficientData { needed: 10, got: 5 }.to_code(),
            5
        );
        assert_eq!(
            AnalysisError::InvalidParameter {
                param: "threshold".into(),
                value: "7".into(),
                reason: "must be between 1 and 5".into()
            }
            .to_code(),
            6
        );
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::TrendAnalysis("non-finite value at index 3".into());
        assert_eq!(
            format!("{}", err),
            "Trend analysis failed: non-finite value at index 3"
        );

        let err = AnalysisError::Forecasting("fit diverged".into());
        assert_eq!(format!("{}", err), "Forecasting failed: fit diverged");

        let err = AnalysisError::AnomalyDetection("overflow".into());
        assert_eq!(format!("{}", err), "Anomaly detection failed: overflow");

        let err = AnalysisError::InsufficientData { needed: 10, got: 3 };
        assert_eq!(
            format!("{}", err),
            "Insufficient data: need at least 10 observations, got 3"
        );

        let err = AnalysisError::InvalidParameter {
            param: "forecast_periods".into(),
            value: "400".into(),
            reason: "must be between 1 and 365".into(),
        };
        assert_eq!(
            format!("{}", err),
            "Invalid parameter 'forecast_periods' = '400': must be between 1 and 365"
        );
    }

    #[test]
    fn test_operation_failure_wraps_cause() {
        assert_eq!(
            Operation::Trend.failure("boom"),
            AnalysisError::TrendAnalysis("boom".into())
        );
        assert_eq!(
            Operation::Forecast.failure(String::from("boom")),
            AnalysisError::Forecasting("boom".into())
        );
        assert_eq!(Operation::Anomaly.failure("boom").to_code(), 3);
    }
}
