//! C FFI boundary for the advisory analysis service.
//!
//! Two surfaces over the same core: `#[repr(C)]` structs for callers that
//! want typed results, and JSON-in/JSON-out functions that accept the
//! service's request payloads. Every function validates request bounds
//! before running an analysis.

pub mod allocation;
pub mod conversion;
pub mod error_handling;
pub mod payload;
pub mod types;
pub mod validation;

use libc::{c_char, c_double, c_int, size_t};
use std::ptr;

use advisory_core::stats::ensure_finite;
use advisory_core::{
    AnomalyOptions as CoreAnomalyOptions, Operation, DEFAULT_MOVING_AVERAGE_WINDOW,
};
use allocation::{opt_str_to_c_string, slice_to_c_array, str_to_c_string, vec_to_c_double_array};
use conversion::{c_str_to_utf8, series_from_raw, timestamps_from_raw, to_option_usize};
use error_handling::{check_null_pointers, ffi_try, init_error, set_error};

pub use types::*;

unsafe fn report_allocation_failure(out_error: *mut AdvisoryError) {
    set_error(out_error, ErrorCode::AllocationError, "Memory allocation failed");
}

// ============================================================================
// Struct ABI
// ============================================================================

/// Analyze a series for a linear trend.
///
/// `timestamps` may be null; otherwise it holds `n_timestamps` labels, one
/// per observation.
///
/// # Safety
/// `metric_name` must be a valid C string, `values` must hold `length`
/// doubles, and `out_result` must be writable. Free the result with
/// `advisory_free_trend_result`.
#[no_mangle]
pub unsafe extern "C" fn advisory_analyze_trend(
    metric_name: *const c_char,
    values: *const c_double,
    length: size_t,
    timestamps: *const *const c_char,
    n_timestamps: size_t,
    out_result: *mut TrendResult,
    out_error: *mut AdvisoryError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(
        out_error,
        &[
            metric_name as *const core::ffi::c_void,
            values as *const core::ffi::c_void,
            out_result as *const core::ffi::c_void,
        ],
    ) {
        return false;
    }

    let result = ffi_try(out_error, || {
        let name = c_str_to_utf8(metric_name, "metric_name")?;
        let series = series_from_raw(values, length);
        let labels = timestamps_from_raw(timestamps, n_timestamps)?;
        validation::validate_trend_request(series, labels.as_deref())?;
        advisory_core::analyze_trend(name, series, labels.as_deref())
    });

    let Some(trend) = result else {
        return false;
    };

    let mut out = TrendResult {
        direction: trend.trend_direction.into(),
        slope: trend.slope,
        confidence: trend.confidence,
        data_points_analyzed: trend.data_points_analyzed,
        explanation: str_to_c_string(&trend.explanation),
        period_start: opt_str_to_c_string(trend.period_start.as_deref()),
        period_end: opt_str_to_c_string(trend.period_end.as_deref()),
    };

    if out.explanation.is_null()
        || (trend.period_start.is_some() && out.period_start.is_null())
        || (trend.period_end.is_some() && out.period_end.is_null())
    {
        advisory_free_trend_result(&mut out);
        report_allocation_failure(out_error);
        return false;
    }

    *out_result = out;
    true
}

/// Forecast future periods of a series.
///
/// A null `options` uses the linear strategy with a 30-period horizon.
///
/// # Safety
/// `metric_name` must be a valid C string, `values` must hold `length`
/// doubles, and `out_result` must be writable. Free the result with
/// `advisory_free_forecast_result`.
#[no_mangle]
pub unsafe extern "C" fn advisory_forecast(
    metric_name: *const c_char,
    values: *const c_double,
    length: size_t,
    options: *const ForecastOptions,
    out_result: *mut ForecastResult,
    out_error: *mut AdvisoryError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(
        out_error,
        &[
            metric_name as *const core::ffi::c_void,
            values as *const core::ffi::c_void,
            out_result as *const core::ffi::c_void,
        ],
    ) {
        return false;
    }

    let opts = if options.is_null() {
        ForecastOptions::default()
    } else {
        *options
    };

    let result = ffi_try(out_error, || {
        let name = c_str_to_utf8(metric_name, "metric_name")?;
        let series = series_from_raw(values, length);
        let horizon = usize::try_from(opts.horizon).unwrap_or(0);
        validation::validate_forecast_request(series, horizon)?;
        let core_opts = advisory_core::ForecastOptions {
            horizon,
            strategy: opts.core_strategy()?,
        };
        advisory_core::forecast(name, series, &core_opts)
    });

    let Some(fc) = result else {
        return false;
    };

    let predicted: Vec<f64> = fc.forecasts.iter().map(|p| p.predicted_value).collect();
    let lower: Vec<f64> = fc.forecasts.iter().map(|p| p.lower_bound).collect();
    let upper: Vec<f64> = fc.forecasts.iter().map(|p| p.upper_bound).collect();
    let confidences: Vec<f64> = fc.forecasts.iter().map(|p| p.confidence).collect();

    let mut out = ForecastResult {
        predicted_values: vec_to_c_double_array(&predicted),
        lower_bounds: vec_to_c_double_array(&lower),
        upper_bounds: vec_to_c_double_array(&upper),
        confidences: vec_to_c_double_array(&confidences),
        n_forecasts: fc.forecasts.len(),
        confidence: fc.confidence,
        explanation: str_to_c_string(&fc.explanation),
        ..Default::default()
    };
    allocation::copy_string_to_buffer(&fc.model_used, &mut out.model_name);

    let arrays_missing = out.n_forecasts > 0
        && (out.predicted_values.is_null()
            || out.lower_bounds.is_null()
            || out.upper_bounds.is_null()
            || out.confidences.is_null());
    if arrays_missing || out.explanation.is_null() {
        advisory_free_forecast_result(&mut out);
        report_allocation_failure(out_error);
        return false;
    }

    *out_result = out;
    true
}

/// Flag observations whose z-score reaches the threshold.
///
/// A null `options` uses a threshold of 3.0. Timestamps are validated but
/// not copied into the struct result; the JSON surface carries them.
///
/// # Safety
/// `metric_name` must be a valid C string, `values` must hold `length`
/// doubles, and `out_result` must be writable. Free the result with
/// `advisory_free_anomaly_result`.
#[no_mangle]
pub unsafe extern "C" fn advisory_detect_anomalies(
    metric_name: *const c_char,
    values: *const c_double,
    length: size_t,
    timestamps: *const *const c_char,
    n_timestamps: size_t,
    options: *const AnomalyOptions,
    out_result: *mut AnomalyResult,
    out_error: *mut AdvisoryError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(
        out_error,
        &[
            metric_name as *const core::ffi::c_void,
            values as *const core::ffi::c_void,
            out_result as *const core::ffi::c_void,
        ],
    ) {
        return false;
    }

    let opts = if options.is_null() {
        AnomalyOptions::default()
    } else {
        *options
    };

    let result = ffi_try(out_error, || {
        let name = c_str_to_utf8(metric_name, "metric_name")?;
        let series = series_from_raw(values, length);
        let labels = timestamps_from_raw(timestamps, n_timestamps)?;
        validation::validate_anomaly_request(series, labels.as_deref(), opts.threshold)?;
        advisory_core::detect_anomalies(
            name,
            series,
            labels.as_deref(),
            &CoreAnomalyOptions {
                threshold: opts.threshold,
            },
        )
    });

    let Some(detected) = result else {
        return false;
    };

    let anomalies = &detected.anomalies;
    let indices: Vec<size_t> = anomalies.iter().map(|a| a.index).collect();
    let flagged: Vec<f64> = anomalies.iter().map(|a| a.value).collect();
    let expected: Vec<f64> = anomalies.iter().map(|a| a.expected_value).collect();
    let deviations: Vec<f64> = anomalies
        .iter()
        .map(|a| a.deviation.unwrap_or(f64::NAN))
        .collect();
    let z_scores: Vec<f64> = anomalies.iter().map(|a| a.z_score).collect();
    let severities: Vec<c_int> = anomalies
        .iter()
        .map(|a| SeverityCode::from(a.severity) as c_int)
        .collect();

    let mut out = AnomalyResult {
        indices: slice_to_c_array(&indices),
        values: vec_to_c_double_array(&flagged),
        expected_values: vec_to_c_double_array(&expected),
        deviations: vec_to_c_double_array(&deviations),
        z_scores: vec_to_c_double_array(&z_scores),
        severities: slice_to_c_array(&severities),
        n_anomalies: anomalies.len(),
        explanation: str_to_c_string(&detected.explanation),
    };

    let arrays_missing = out.n_anomalies > 0
        && (out.indices.is_null()
            || out.values.is_null()
            || out.expected_values.is_null()
            || out.deviations.is_null()
            || out.z_scores.is_null()
            || out.severities.is_null());
    if arrays_missing || out.explanation.is_null() {
        advisory_free_anomaly_result(&mut out);
        report_allocation_failure(out_error);
        return false;
    }

    *out_result = out;
    true
}

/// Confidence percentage for a fit quality and sample size.
#[no_mangle]
pub extern "C" fn advisory_confidence_score(r_squared: c_double, n: size_t) -> c_double {
    advisory_core::confidence_score(r_squared, n)
}

/// Recursive moving-average forecast of `periods` values.
///
/// A `window` of zero or less uses the default window of 5. An empty series
/// yields an empty (null) array. At most 365 periods.
///
/// # Safety
/// `values` must hold `length` doubles when `length > 0`; `out_values` and
/// `out_length` must be writable. Free the array with
/// `advisory_free_double_array`.
#[no_mangle]
pub unsafe extern "C" fn advisory_moving_average_forecast(
    values: *const c_double,
    length: size_t,
    periods: size_t,
    window: c_int,
    out_values: *mut *mut c_double,
    out_length: *mut size_t,
    out_error: *mut AdvisoryError,
) -> bool {
    init_error(out_error);
    if check_null_pointers(
        out_error,
        &[
            out_values as *const core::ffi::c_void,
            out_length as *const core::ffi::c_void,
        ],
    ) {
        return false;
    }
    if values.is_null() && length > 0 {
        set_error(out_error, ErrorCode::NullPointer, "Null pointer argument");
        return false;
    }

    let result = ffi_try(out_error, || {
        let series = series_from_raw(values, length);
        ensure_finite(series, Operation::Forecast)?;
        validation::validate_moving_average_periods(periods)?;
        let window = to_option_usize(window).unwrap_or(DEFAULT_MOVING_AVERAGE_WINDOW);
        Ok(advisory_core::moving_average_forecast(series, periods, window))
    });

    let Some(predictions) = result else {
        return false;
    };

    let ptr = vec_to_c_double_array(&predictions);
    if !predictions.is_empty() && ptr.is_null() {
        report_allocation_failure(out_error);
        return false;
    }

    *out_values = ptr;
    *out_length = predictions.len();
    true
}

// ============================================================================
// JSON ABI
// ============================================================================

unsafe fn json_entry(
    request: *const c_char,
    out_error: *mut AdvisoryError,
    handler: fn(&str) -> advisory_core::Result<String>,
) -> *mut c_char {
    init_error(out_error);
    if check_null_pointers(out_error, &[request as *const core::ffi::c_void]) {
        return ptr::null_mut();
    }

    let response = ffi_try(out_error, || {
        let body = c_str_to_utf8(request, "request")?;
        handler(body)
    });

    match response {
        Some(body) => {
            let out = str_to_c_string(&body);
            if out.is_null() {
                report_allocation_failure(out_error);
            }
            out
        }
        None => ptr::null_mut(),
    }
}

/// Trend analysis over a JSON request
/// (`{"metric_name", "data", "timestamps"?}`).
///
/// Returns the JSON response, or null with `out_error` set.
///
/// # Safety
/// `request` must be a valid C string. Free the response with
/// `advisory_free_string`.
#[no_mangle]
pub unsafe extern "C" fn advisory_analyze_trend_json(
    request: *const c_char,
    out_error: *mut AdvisoryError,
) -> *mut c_char {
    json_entry(request, out_error, payload::handle_trend)
}

/// Forecast over a JSON request
/// (`{"metric_name", "data", "forecast_periods"?, "strategy"?}`).
///
/// # Safety
/// `request` must be a valid C string. Free the response with
/// `advisory_free_string`.
#[no_mangle]
pub unsafe extern "C" fn advisory_forecast_json(
    request: *const c_char,
    out_error: *mut AdvisoryError,
) -> *mut c_char {
    json_entry(request, out_error, payload::handle_forecast)
}

/// Anomaly detection over a JSON request
/// (`{"metric_name", "data", "timestamps"?, "threshold"?}`).
///
/// # Safety
/// `request` must be a valid C string. Free the response with
/// `advisory_free_string`.
#[no_mangle]
pub unsafe extern "C" fn advisory_detect_anomalies_json(
    request: *const c_char,
    out_error: *mut AdvisoryError,
) -> *mut c_char {
    json_entry(request, out_error, payload::handle_anomalies)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a trend result.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn advisory_free_trend_result(result: *mut TrendResult) {
    if result.is_null() {
        return;
    }
    let result = &mut *result;
    free_fields!(result, explanation, period_start, period_end);
}

/// Free a forecast result.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn advisory_free_forecast_result(result: *mut ForecastResult) {
    if result.is_null() {
        return;
    }
    let result = &mut *result;
    free_fields!(
        result,
        predicted_values,
        lower_bounds,
        upper_bounds,
        confidences,
        explanation
    );
    result.n_forecasts = 0;
}

/// Free an anomaly result.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn advisory_free_anomaly_result(result: *mut AnomalyResult) {
    if result.is_null() {
        return;
    }
    let result = &mut *result;
    free_fields!(
        result,
        indices,
        values,
        expected_values,
        deviations,
        z_scores,
        severities,
        explanation
    );
    result.n_anomalies = 0;
}

/// Free a double array returned by `advisory_moving_average_forecast`.
///
/// # Safety
/// The pointer must be null or returned by this library.
#[no_mangle]
pub unsafe extern "C" fn advisory_free_double_array(values: *mut c_double) {
    allocation::free_ptr(values as *mut core::ffi::c_void);
}

/// Free a JSON response string.
///
/// # Safety
/// The pointer must be null or returned by one of the `*_json` functions.
#[no_mangle]
pub unsafe extern "C" fn advisory_free_string(s: *mut c_char) {
    allocation::free_ptr(s as *mut core::ffi::c_void);
}
