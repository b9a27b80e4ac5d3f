//! JSON request payloads and their handlers.
//!
//! Each handler parses a request, validates it, runs the analysis and
//! serializes the result. Unknown request fields are ignored.

use advisory_core::{
    analyze_trend, detect_anomalies, forecast, AnalysisError, AnomalyOptions, ForecastOptions,
    ForecastStrategy, Operation, Result, DEFAULT_HORIZON, DEFAULT_THRESHOLD,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::validation::{validate_anomaly_request, validate_forecast_request, validate_trend_request};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendAnalysisRequest {
    pub metric_name: String,
    pub data: Vec<f64>,
    #[serde(default)]
    pub timestamps: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastRequest {
    pub metric_name: String,
    pub data: Vec<f64>,
    #[serde(default = "default_forecast_periods")]
    pub forecast_periods: usize,
    #[serde(default)]
    pub strategy: ForecastStrategy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnomalyDetectionRequest {
    pub metric_name: String,
    pub data: Vec<f64>,
    #[serde(default)]
    pub timestamps: Option<Vec<String>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_forecast_periods() -> usize {
    DEFAULT_HORIZON
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Parse a request body.
pub fn parse_request<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| {
        debug!(error = %e, "rejected request payload");
        AnalysisError::InvalidInput(format!("malformed request: {}", e))
    })
}

/// Serialize a result. A failure here belongs to the operation that produced it.
fn to_json<T: Serialize>(value: &T, operation: Operation) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| operation.failure(format!("result not serializable: {}", e)))
}

pub fn handle_trend(json: &str) -> Result<String> {
    let req: TrendAnalysisRequest = parse_request(json)?;
    let timestamps = req.timestamps.as_deref();
    validate_trend_request(&req.data, timestamps)?;
    to_json(
        &analyze_trend(&req.metric_name, &req.data, timestamps)?,
        Operation::Trend,
    )
}

pub fn handle_forecast(json: &str) -> Result<String> {
    let req: ForecastRequest = parse_request(json)?;
    validate_forecast_request(&req.data, req.forecast_periods)?;
    let options = ForecastOptions {
        horizon: req.forecast_periods,
        strategy: req.strategy,
    };
    to_json(
        &forecast(&req.metric_name, &req.data, &options)?,
        Operation::Forecast,
    )
}

pub fn handle_anomalies(json: &str) -> Result<String> {
    let req: AnomalyDetectionRequest = parse_request(json)?;
    let timestamps = req.timestamps.as_deref();
    validate_anomaly_request(&req.data, timestamps, req.threshold)?;
    let options = AnomalyOptions {
        threshold: req.threshold,
    };
    to_json(
        &detect_anomalies(&req.metric_name, &req.data, timestamps, &options)?,
        Operation::Anomaly,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn call(handler: fn(&str) -> Result<String>, request: Value) -> Result<Value> {
        let body = handler(&request.to_string())?;
        Ok(serde_json::from_str(&body).unwrap())
    }

    #[test]
    fn test_request_defaults() {
        let req: ForecastRequest =
            parse_request(r#"{"metric_name": "revenue", "data": [1, 2, 3, 4, 5]}"#).unwrap();
        assert_eq!(req.forecast_periods, 30);
        assert_eq!(req.strategy, ForecastStrategy::LinearRegression);

        let req: AnomalyDetectionRequest =
            parse_request(r#"{"metric_name": "m", "data": [], "extra": true}"#).unwrap();
        assert_eq!(req.threshold, 3.0);
        assert_eq!(req.timestamps, None);
    }

    #[test]
    fn test_malformed_request() {
        let err = handle_trend(r#"{"metric_name": "revenue"}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert!(err.to_string().contains("missing field `data`"));

        assert!(handle_trend("not json").is_err());
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("NaN in result"))
        }
    }

    #[test]
    fn test_serialization_failure_is_a_computation_failure() {
        let err = to_json(&Unserializable, Operation::Forecast).unwrap_err();
        assert!(matches!(err, AnalysisError::Forecasting(_)));
        assert_eq!(
            err.to_string(),
            "Forecasting failed: result not serializable: NaN in result"
        );
        assert!(matches!(
            to_json(&Unserializable, Operation::Anomaly),
            Err(AnalysisError::AnomalyDetection(_))
        ));
    }

    #[test]
    fn test_trend_response_shape() {
        let out = call(
            handle_trend,
            json!({
                "metric_name": "signups",
                "data": [10, 12, 14, 16],
                "timestamps": ["w1", "w2", "w3", "w4"],
            }),
        )
        .unwrap();

        assert_eq!(out["metric_name"], "signups");
        assert_eq!(out["trend_direction"], "upward");
        assert_eq!(out["slope"], 2.0);
        assert_eq!(out["data_points_analyzed"], 4);
        assert_eq!(out["period_start"], "w1");
        assert_eq!(out["period_end"], "w4");
    }

    #[test]
    fn test_trend_without_timestamps_serializes_null_period() {
        let out = call(
            handle_trend,
            json!({"metric_name": "m", "data": [3, 1]}),
        )
        .unwrap();
        assert_eq!(out["trend_direction"], "downward");
        assert_eq!(out["period_start"], Value::Null);
    }

    #[test]
    fn test_trend_rejects_single_point() {
        let err = handle_trend(&json!({"metric_name": "m", "data": [1]}).to_string()).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { needed: 2, got: 1 });
    }

    #[test]
    fn test_forecast_response_shape() {
        let out = call(
            handle_forecast,
            json!({
                "metric_name": "revenue",
                "data": [1, 2, 3, 4, 5, 6],
                "forecast_periods": 3,
            }),
        )
        .unwrap();

        assert_eq!(out["model_used"], "Linear Regression with Confidence Intervals");
        let points = out["forecasts"].as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0]["period"], 1);
        assert_eq!(points[0]["predicted_value"], 7.0);
        assert_eq!(points[2]["predicted_value"], 9.0);
        // Perfect fit: zero residual spread
        assert_eq!(points[2]["lower_bound"], 9.0);
        assert_eq!(points[2]["upper_bound"], 9.0);
    }

    #[test]
    fn test_forecast_moving_average_strategy() {
        let out = call(
            handle_forecast,
            json!({
                "metric_name": "m",
                "data": [5, 5, 5, 5, 5, 5],
                "forecast_periods": 2,
                "strategy": {"type": "moving_average"},
            }),
        )
        .unwrap();
        assert_eq!(out["model_used"], "Simple Moving Average (window 5)");
        assert_eq!(out["forecasts"][1]["predicted_value"], 5.0);
    }

    #[test]
    fn test_forecast_horizon_bounds() {
        let err = handle_forecast(
            &json!({"metric_name": "m", "data": [1, 2, 3, 4, 5], "forecast_periods": 400})
                .to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));

        let err = handle_forecast(
            &json!({"metric_name": "m", "data": [1, 2, 3, 4, 5], "forecast_periods": -1})
                .to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn test_anomaly_response_shape() {
        let mut data = vec![0.0; 9];
        data.push(100.0);
        let labels: Vec<String> = (0..10).map(|i| format!("t{}", i)).collect();
        let out = call(
            handle_anomalies,
            json!({"metric_name": "errors", "data": data, "timestamps": labels}),
        )
        .unwrap();

        assert_eq!(out["total_anomalies"], 1);
        let anomaly = &out["anomalies"][0];
        assert_eq!(anomaly["index"], 9);
        assert_eq!(anomaly["value"], 100.0);
        assert_eq!(anomaly["expected_value"], 10.0);
        assert_eq!(anomaly["deviation"], 900.0);
        assert_eq!(anomaly["z_score"], 3.0);
        assert_eq!(anomaly["severity"], "medium");
        assert_eq!(anomaly["timestamp"], "t9");
    }

    #[test]
    fn test_anomaly_threshold_bounds() {
        let err = handle_anomalies(
            &json!({"metric_name": "m", "data": vec![0; 10], "threshold": 0.5}).to_string(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidParameter { ref param, .. } if param == "threshold"
        ));
    }
}
