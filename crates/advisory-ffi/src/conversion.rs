//! Parameter conversion utilities for FFI functions.

use advisory_core::AnalysisError;
use core::ffi::{c_char, c_double, c_int};
use std::ffi::CStr;

/// Convert a `c_int` to `Option<usize>`, where values <= 0 become None.
#[inline]
pub fn to_option_usize(value: c_int) -> Option<usize> {
    if value > 0 {
        Some(value as usize)
    } else {
        None
    }
}

/// Borrow a C string as UTF-8, failing on invalid bytes.
///
/// # Safety
/// The pointer must be non-null and point to a valid null-terminated string.
pub unsafe fn c_str_to_utf8<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, AnalysisError> {
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| AnalysisError::InvalidInput(format!("{} is not valid UTF-8: {}", what, e)))
}

/// Borrow the input series. A zero length gives an empty slice.
///
/// # Safety
/// `data` must point to `length` readable doubles when `length > 0`.
pub unsafe fn series_from_raw<'a>(data: *const c_double, length: usize) -> &'a [f64] {
    if length == 0 || data.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(data, length)
    }
}

/// Copy a C array of timestamp labels.
///
/// A null array means no timestamps. A null entry inside the array is
/// rejected.
///
/// # Safety
/// `labels` must be null or point to `n_labels` C string pointers.
pub unsafe fn timestamps_from_raw(
    labels: *const *const c_char,
    n_labels: usize,
) -> Result<Option<Vec<String>>, AnalysisError> {
    if labels.is_null() {
        return Ok(None);
    }

    let ptrs = std::slice::from_raw_parts(labels, n_labels);
    let mut out = Vec::with_capacity(n_labels);
    for (i, &p) in ptrs.iter().enumerate() {
        if p.is_null() {
            return Err(AnalysisError::InvalidInput(format!(
                "timestamp {} is a null pointer",
                i
            )));
        }
        out.push(c_str_to_utf8(p, "timestamp")?.to_string());
    }
    Ok(Some(out))
}
