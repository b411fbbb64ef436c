//! C ABI exports for native tools.
//!
//! Every `case_*` function follows this contract:
//!
//! 1. Clears the last error
//! 2. Performs the operation
//! 3. On error: stores message via `set_last_error`, returns `-1`
//! 4. On success: returns the result
//!
//! `case_host_system` is the exception: it returns the raw shell status,
//! which may itself be `-1`. It only sets the last error for bad arguments.

use std::os::raw::c_char;
use std::path::PathBuf;

use tracing::error;

use crate::command;
use crate::config::HostConfig;
use crate::convert;
use crate::error::{clear_last_error, set_last_error, HostError};
use crate::host::ScriptHost;

/// Shorthand: read an optional C string argument (null means "not given").
///
/// # Safety
/// Pointer must be null or valid, null-terminated, UTF-8.
unsafe fn opt_arg_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { convert::cstr_to_str(ptr) }.map(Some)
}

fn run_status(config: HostConfig) -> i32 {
    match ScriptHost::new(config).run() {
        Ok(_) => 0,
        Err(e) => fail(e),
    }
}

fn fail(e: HostError) -> i32 {
    error!(error = %e, "script host failed");
    set_last_error(e.to_string());
    -1
}

/// Run the translator with the default configuration.
///
/// `script` overrides the script path; pass null for `case_translator.py`.
/// Returns `0` on success, `-1` on error.
///
/// # Safety
/// `script` must be null or a valid, null-terminated, UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn case_host_run(script: *const c_char) -> i32 {
    clear_last_error();
    let mut config = HostConfig::default();
    match unsafe { opt_arg_str(script) } {
        Ok(Some(path)) => config.script = PathBuf::from(path),
        Ok(None) => {}
        Err(e) => {
            set_last_error(e);
            return -1;
        }
    }
    run_status(config)
}

/// Run the translator with a TOML config file (null for defaults).
///
/// Returns `0` on success, `-1` on error.
///
/// # Safety
/// `config_path` must be null or a valid, null-terminated, UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn case_host_run_config(config_path: *const c_char) -> i32 {
    clear_last_error();
    let config = match unsafe { opt_arg_str(config_path) } {
        Ok(Some(path)) => match HostConfig::load(path) {
            Ok(config) => config,
            Err(e) => return fail(e),
        },
        Ok(None) => HostConfig::default(),
        Err(e) => {
            set_last_error(e);
            return -1;
        }
    };
    run_status(config)
}

/// Run a shell command and return its raw status.
///
/// A negative status is returned as-is; it is not reported as an error.
///
/// # Safety
/// `cmd` must be a valid, null-terminated, UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn case_host_system(cmd: *const c_char) -> i32 {
    clear_last_error();
    match unsafe { convert::cstr_to_str(cmd) } {
        Ok(cmd) => command::system(cmd),
        Err(e) => {
            set_last_error(e);
            command::SPAWN_FAILED
        }
    }
}
