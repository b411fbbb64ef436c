//! Error types, plus the thread-local last-error slot used by the C ABI.
//!
//! Rust callers get typed errors (`HostError`, `CommandError`,
//! `ConvertError`). C callers get a sentinel return value and read the
//! message with `case_last_error()`.
//!
//! **Ownership rules:**
//! - `case_last_error()` returns a pointer owned by TLS — do NOT free it.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::path::PathBuf;

use pyo3::prelude::*;
use thiserror::Error;

use crate::convert;

/// Failures of the script host, one variant per step of a run.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Python interpreter setup failed: {0}")]
    Interpreter(String),

    #[error("Failed to import module '{module}': {message}")]
    Import { module: String, message: String },

    #[error("Failed to bind '{name}' into the namespace: {message}")]
    Bind { name: String, message: String },

    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Failed to read script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Script {} raised an error: {message}", path.display())]
    Script { path: PathBuf, message: String },

    #[error("Callback failed for export '{export}': {message}")]
    Callback { export: String, message: String },

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl HostError {
    /// Wrap a Python error raised while setting up the interpreter.
    pub(crate) fn interpreter(py: Python<'_>, err: PyErr) -> Self {
        Self::Interpreter(convert::pyerr_to_string(py, err))
    }

    pub(crate) fn bind(py: Python<'_>, name: &str, err: PyErr) -> Self {
        Self::Bind {
            name: name.to_owned(),
            message: convert::pyerr_to_string(py, err),
        }
    }
}

/// Failures surfaced by `command::system_checked`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("System command failed with status {status}: {command}")]
    Failed { command: String, status: i32 },
}

/// Failures converting a tool's exported string into a typed value.
#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    #[error("Unknown property type '{0}'")]
    UnknownType(String),

    #[error("Improper bool value '{0}'")]
    InvalidBool(String),

    #[error("Improper int value '{0}'")]
    InvalidInt(String),

    #[error("Improper float value '{0}'")]
    InvalidFloat(String),

    #[error("Improper datetime value '{0}'")]
    InvalidDateTime(String),
}

pub type Result<T> = std::result::Result<T, HostError>;

// ==================== C ABI last error ====================

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message in thread-local storage.
pub fn set_last_error(msg: impl Into<String>) {
    let msg = msg.into();
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the thread-local error.
pub fn clear_last_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Get a pointer to the last error message, or null if none.
///
/// The returned pointer is valid until the next `case_*` call.
/// Do NOT free this pointer.
#[no_mangle]
pub extern "C" fn case_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |s| s.as_ptr())
    })
}

/// Clear the last error message.
#[no_mangle]
pub extern "C" fn case_last_error_clear() {
    clear_last_error();
}
