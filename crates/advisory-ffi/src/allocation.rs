//! Memory allocation utilities for FFI functions.
//!
//! Everything handed to C is allocated with `malloc` so it can be released
//! with `free`, either directly or through the `advisory_free_*` functions.

use core::ffi::{c_char, c_double};
use libc::{free, malloc};
use std::ptr;

/// Copy a Rust slice to a newly allocated C array.
///
/// # Safety
/// Returns null on allocation failure or if slice is empty.
pub unsafe fn slice_to_c_array<T: Copy>(slice: &[T]) -> *mut T {
    if slice.is_empty() {
        return ptr::null_mut();
    }

    let ptr = malloc(std::mem::size_of_val(slice)) as *mut T;
    if !ptr.is_null() {
        ptr::copy_nonoverlapping(slice.as_ptr(), ptr, slice.len());
    }
    ptr
}

/// Copy a `Vec<f64>` to a newly allocated C double array.
///
/// # Safety
/// Returns null on allocation failure or if vec is empty.
#[inline]
pub unsafe fn vec_to_c_double_array(vec: &[f64]) -> *mut c_double {
    slice_to_c_array(vec)
}

/// Copy a string into a newly allocated NUL-terminated C string.
///
/// Interior NUL bytes would truncate the string on the C side, so the copy
/// stops at the first one.
///
/// # Safety
/// Returns null on allocation failure.
pub unsafe fn str_to_c_string(s: &str) -> *mut c_char {
    let bytes = s.as_bytes();
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    let ptr = malloc(len + 1) as *mut c_char;
    if ptr.is_null() {
        return ptr;
    }
    ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, ptr, len);
    *ptr.add(len) = 0; // Null terminator
    ptr
}

/// Copy an optional string; `None` becomes a null pointer.
///
/// # Safety
/// Returns null on allocation failure.
#[inline]
pub unsafe fn opt_str_to_c_string(s: Option<&str>) -> *mut c_char {
    match s {
        Some(s) => str_to_c_string(s),
        None => ptr::null_mut(),
    }
}

/// Copy a string to a fixed-size char buffer, truncating to fit.
pub fn copy_string_to_buffer(s: &str, buffer: &mut [c_char]) {
    if buffer.is_empty() {
        return;
    }
    let bytes = s.as_bytes();
    let len = bytes.len().min(buffer.len() - 1);
    for (i, &b) in bytes[..len].iter().enumerate() {
        buffer[i] = b as c_char;
    }
    buffer[len] = 0;
}

/// Free a C pointer previously returned by `malloc`.
///
/// # Safety
/// ptr must be either null or a valid pointer allocated by malloc.
#[inline]
pub unsafe fn free_ptr(ptr: *mut core::ffi::c_void) {
    if !ptr.is_null() {
        free(ptr);
    }
}

/// Free the named pointer fields of a struct and null them out.
///
/// Usage:
/// ```ignore
/// free_fields!(result, field1, field2, field3);
/// ```
#[macro_export]
macro_rules! free_fields {
    ($result:expr, $($field:ident),+ $(,)?) => {{
        $(
            if !$result.$field.is_null() {
                $crate::allocation::free_ptr($result.$field as *mut core::ffi::c_void);
                $result.$field = std::ptr::null_mut();
            }
        )+
    }};
}
