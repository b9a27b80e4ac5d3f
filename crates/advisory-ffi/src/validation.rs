//! Request bounds checked before any analysis runs.
//!
//! The core assumes these hold, so every exported entry point, struct or
//! JSON, goes through one of the `validate_*` functions first.

use advisory_core::{AnalysisError, Result};

/// Fewest observations a trend can be fitted on.
pub const MIN_TREND_POINTS: usize = 2;
/// Fewest observations a forecast is produced from.
pub const MIN_FORECAST_POINTS: usize = 5;
/// Longest forecast horizon accepted.
pub const MAX_FORECAST_HORIZON: usize = 365;
/// Fewest observations anomaly detection runs on.
pub const MIN_ANOMALY_POINTS: usize = 10;
/// Accepted z-score threshold range, inclusive.
pub const THRESHOLD_RANGE: (f64, f64) = (1.0, 5.0);

fn require_points(values: &[f64], needed: usize) -> Result<()> {
    if values.len() < needed {
        return Err(AnalysisError::InsufficientData {
            needed,
            got: values.len(),
        });
    }
    Ok(())
}

/// Timestamps, when given, label the series one-to-one.
pub fn validate_timestamps(values: &[f64], timestamps: Option<&[String]>) -> Result<()> {
    match timestamps {
        Some(ts) if ts.len() != values.len() => Err(AnalysisError::InvalidInput(format!(
            "{} timestamps supplied for {} data points",
            ts.len(),
            values.len()
        ))),
        _ => Ok(()),
    }
}

pub fn validate_trend_request(values: &[f64], timestamps: Option<&[String]>) -> Result<()> {
    require_points(values, MIN_TREND_POINTS)?;
    validate_timestamps(values, timestamps)
}

pub fn validate_forecast_request(values: &[f64], horizon: usize) -> Result<()> {
    require_points(values, MIN_FORECAST_POINTS)?;
    if !(1..=MAX_FORECAST_HORIZON).contains(&horizon) {
        return Err(AnalysisError::InvalidParameter {
            param: "forecast_periods".to_string(),
            value: horizon.to_string(),
            reason: format!("must be between 1 and {}", MAX_FORECAST_HORIZON),
        });
    }
    Ok(())
}

/// The bare moving-average export allows zero periods but shares the cap.
pub fn validate_moving_average_periods(periods: usize) -> Result<()> {
    if periods > MAX_FORECAST_HORIZON {
        return Err(AnalysisError::InvalidParameter {
            param: "periods".to_string(),
            value: periods.to_string(),
            reason: format!("must be at most {}", MAX_FORECAST_HORIZON),
        });
    }
    Ok(())
}

pub fn validate_anomaly_request(
    values: &[f64],
    timestamps: Option<&[String]>,
    threshold: f64,
) -> Result<()> {
    require_points(values, MIN_ANOMALY_POINTS)?;
    let (lo, hi) = THRESHOLD_RANGE;
    // NaN fails the range check
    if !(lo..=hi).contains(&threshold) {
        return Err(AnalysisError::InvalidParameter {
            param: "threshold".to_string(),
            value: threshold.to_string(),
            reason: format!("must be between {} and {}", lo, hi),
        });
    }
    validate_timestamps(values, timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|d| format!("2024-01-{:02}", d)).collect()
    }

    #[test]
    fn test_trend_bounds() {
        assert_eq!(
            validate_trend_request(&[1.0], None),
            Err(AnalysisError::InsufficientData { needed: 2, got: 1 })
        );
        assert!(validate_trend_request(&[1.0, 2.0], None).is_ok());
        assert!(validate_trend_request(&[1.0, 2.0], Some(&labels(2))).is_ok());
    }

    #[test]
    fn test_timestamp_length_must_match() {
        let err = validate_trend_request(&[1.0, 2.0, 3.0], Some(&labels(2))).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidInput("2 timestamps supplied for 3 data points".into())
        );
    }

    #[test]
    fn test_forecast_bounds() {
        let values = [1.0; 5];
        assert!(validate_forecast_request(&values, 1).is_ok());
        assert!(validate_forecast_request(&values, 365).is_ok());
        assert!(matches!(
            validate_forecast_request(&values, 0),
            Err(AnalysisError::InvalidParameter { .. })
        ));
        assert!(matches!(
            validate_forecast_request(&values, 366),
            Err(AnalysisError::InvalidParameter { .. })
        ));
        assert_eq!(
            validate_forecast_request(&values[..4], 30),
            Err(AnalysisError::InsufficientData { needed: 5, got: 4 })
        );
    }

    #[test]
    fn test_moving_average_periods_cap() {
        assert!(validate_moving_average_periods(0).is_ok());
        assert!(validate_moving_average_periods(365).is_ok());
        assert!(validate_moving_average_periods(366).is_err());
    }

    #[test]
    fn test_anomaly_bounds() {
        let values = [1.0; 10];
        assert!(validate_anomaly_request(&values, None, 1.0).is_ok());
        assert!(validate_anomaly_request(&values, None, 5.0).is_ok());
        for bad in [0.5, 5.5, f64::NAN] {
            assert!(matches!(
                validate_anomaly_request(&values, None, bad),
                Err(AnalysisError::InvalidParameter { .. })
            ));
        }
        assert_eq!(
            validate_anomaly_request(&values[..9], None, 3.0),
            Err(AnalysisError::InsufficientData { needed: 10, got: 9 })
        );
        assert!(validate_anomaly_request(&values, Some(&labels(4)), 3.0).is_err());
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = validate_anomaly_request(&[0.0; 10], None, 7.5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'threshold' = '7.5': must be between 1 and 5"
        );
    }
}
