//! FFI bindings for Dayscore
//!
//! This module provides C-compatible functions for calling the engine from
//! other languages. Stores and results cross the boundary as JSON in
//! null-terminated C strings; returned strings are allocated here and must be
//! freed by the caller using `dayscore_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::aggregator::WindowAggregator;
use crate::calendar::parse_date;
use crate::error::StoreError;
use crate::normalizer::WeightNormalizer;
use crate::scorer::DayScorer;
use crate::store::StoreAdapter;
use crate::types::DayKind;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result back across the boundary, recording the error on failure
fn respond(result: Result<String, StoreError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::EncodingError(e.to_string()))
}

// ============================================================================
// Analytics
// ============================================================================

/// Compute the weekly report for the 7 days ending on `anchor`.
///
/// `subset_json` is an optional JSON array of habit ids; NULL (or an empty
/// array) means every active habit.
///
/// # Safety
/// - `store_json` and `anchor` must be valid null-terminated C strings.
/// - `subset_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `dayscore_free_string`.
/// - Returns NULL on error; call `dayscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayscore_weekly_report(
    store_json: *const c_char,
    anchor: *const c_char,
    subset_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let store_str = match cstr_to_string(store_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid store string pointer");
            return ptr::null_mut();
        }
    };

    let anchor_str = match cstr_to_string(anchor) {
        Some(s) => s,
        None => {
            set_last_error("Invalid anchor string pointer");
            return ptr::null_mut();
        }
    };

    let subset_str = if subset_json.is_null() {
        None
    } else {
        match cstr_to_string(subset_json) {
            Some(s) => Some(s),
            None => {
                set_last_error("Invalid subset string pointer");
                return ptr::null_mut();
            }
        }
    };

    respond(weekly_report(&store_str, &anchor_str, subset_str.as_deref()))
}

fn weekly_report(store_json: &str, anchor: &str, subset: Option<&str>) -> Result<String, StoreError> {
    let store = StoreAdapter::parse(store_json)?.store;
    let anchor = parse_date(anchor)?;
    let subset: Option<Vec<String>> = subset.map(serde_json::from_str).transpose()?;

    let report = WindowAggregator::new(&store).report(anchor, subset.as_deref());
    to_json(&report)
}

/// Compute the score and per-habit breakdown for one date.
///
/// # Safety
/// - `store_json` and `date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `dayscore_free_string`.
/// - Returns NULL on error; call `dayscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayscore_day_breakdown(
    store_json: *const c_char,
    date: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let store_str = match cstr_to_string(store_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid store string pointer");
            return ptr::null_mut();
        }
    };

    let date_str = match cstr_to_string(date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid date string pointer");
            return ptr::null_mut();
        }
    };

    respond(day_breakdown(&store_str, &date_str))
}

fn day_breakdown(store_json: &str, date: &str) -> Result<String, StoreError> {
    let store = StoreAdapter::parse(store_json)?.store;
    let date = parse_date(date)?;
    let entry = store.entry_or_empty(date);
    to_json(&DayScorer::breakdown(&entry, date, &store.habits))
}

/// Normalized weights (habit id to percent) for a day kind.
///
/// # Safety
/// - `store_json` and `kind` must be valid null-terminated C strings.
/// - `kind` is one of `weekday`, `fri`, `sat`, `sun`.
/// - Returns a newly allocated string that must be freed with `dayscore_free_string`.
/// - Returns NULL on error; call `dayscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayscore_normalized_weights(
    store_json: *const c_char,
    kind: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let store_str = match cstr_to_string(store_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid store string pointer");
            return ptr::null_mut();
        }
    };

    let kind_str = match cstr_to_string(kind) {
        Some(s) => s,
        None => {
            set_last_error("Invalid kind string pointer");
            return ptr::null_mut();
        }
    };

    respond(normalized_weights(&store_str, &kind_str))
}

fn normalized_weights(store_json: &str, kind: &str) -> Result<String, StoreError> {
    let store = StoreAdapter::parse(store_json)?.store;
    let kind: DayKind = kind.parse()?;
    to_json(&WeightNormalizer::normalize(&store.habits, kind))
}

/// List the coercions the store loader would apply, as a JSON array of messages.
///
/// # Safety
/// - `store_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `dayscore_free_string`.
/// - Returns NULL on error; call `dayscore_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayscore_validate_store(store_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let store_str = match cstr_to_string(store_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid store string pointer");
            return ptr::null_mut();
        }
    };

    respond(StoreAdapter::validate(&store_str).and_then(|issues| {
        let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        to_json(&messages)
    }))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Dayscore functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Dayscore function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn dayscore_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Dayscore function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn dayscore_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Dayscore library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn dayscore_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
