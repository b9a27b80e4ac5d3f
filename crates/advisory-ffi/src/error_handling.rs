//! Error plumbing shared by every exported function.

use crate::types::{AdvisoryError, ErrorCode};
use advisory_core::AnalysisError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Initialize error output to success state.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn init_error(out_error: *mut AdvisoryError) {
    if !out_error.is_null() {
        *out_error = AdvisoryError::success();
    }
}

/// Set an error on the output error pointer.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn set_error(out_error: *mut AdvisoryError, code: ErrorCode, message: &str) {
    if !out_error.is_null() {
        (*out_error).set_error(code, message);
    }
}

/// Check if any of the given pointers are null, and set an error if so.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn check_null_pointers(
    out_error: *mut AdvisoryError,
    ptrs: &[*const core::ffi::c_void],
) -> bool {
    if ptrs.iter().any(|p| p.is_null()) {
        set_error(out_error, ErrorCode::NullPointer, "Null pointer argument");
        return true;
    }
    false
}

/// Run `f`, translating its error or panic into `out_error`.
///
/// The error output is reset to success first. The analysis error's own
/// variant decides the code.
///
/// # Safety
/// The error pointer must be valid if non-null.
///
/// # Returns
/// `Some(value)` on success, `None` on error
pub unsafe fn ffi_try<F, T>(out_error: *mut AdvisoryError, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, AnalysisError>,
{
    init_error(out_error);

    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            set_error(out_error, ErrorCode::from(&e), &e.to_string());
            None
        }
        Err(_) => {
            warn!("panic caught at the FFI boundary");
            set_error(out_error, ErrorCode::PanicCaught, "Panic in Rust code");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_error() {
        let mut error = AdvisoryError::default();
        error.set_error(ErrorCode::InvalidInput, "stale");
        unsafe {
            init_error(&mut error);
        }
        assert_eq!(error.code, ErrorCode::Success);
        assert_eq!(error.message_str(), "");
    }

    #[test]
    fn test_check_null_pointers() {
        let mut error = AdvisoryError::default();
        let value = 1.0f64;
        let ok: &[*const core::ffi::c_void] = &[&value as *const f64 as *const _];
        let bad: &[*const core::ffi::c_void] = &[ok[0], std::ptr::null()];
        unsafe {
            assert!(!check_null_pointers(&mut error, ok));
            assert!(check_null_pointers(&mut error, bad));
        }
        assert_eq!(error.code, ErrorCode::NullPointer);
    }

    #[test]
    fn test_ffi_try_success() {
        let mut error = AdvisoryError::default();
        let result = unsafe { ffi_try(&mut error, || Ok::<_, AnalysisError>(42)) };
        assert_eq!(result, Some(42));
        assert_eq!(error.code, ErrorCode::Success);
    }

    #[test]
    fn test_ffi_try_maps_error_variant() {
        let mut error = AdvisoryError::default();
        let result = unsafe {
            ffi_try(&mut error, || {
                Err::<i32, _>(AnalysisError::InsufficientData { needed: 10, got: 3 })
            })
        };
        assert_eq!(result, None);
        assert_eq!(error.code, ErrorCode::InsufficientData);
        assert_eq!(
            error.message_str(),
            "Insufficient data: need at least 10 observations, got 3"
        );
    }

    #[test]
    fn test_ffi_try_catches_panic() {
        let mut error = AdvisoryError::default();
        let result: Option<i32> = unsafe { ffi_try(&mut error, || panic!("boom")) };
        assert_eq!(result, None);
        assert_eq!(error.code, ErrorCode::PanicCaught);
    }

    #[test]
    fn test_ffi_try_null_error_pointer() {
        let result = unsafe {
            ffi_try(std::ptr::null_mut(), || {
                Err::<i32, _>(AnalysisError::InvalidInput("ignored".into()))
            })
        };
        assert_eq!(result, None);
    }
}
