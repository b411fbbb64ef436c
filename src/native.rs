//! The `c_converter` module exposed to translator scripts.
//!
//! Installed into `sys.modules` on every interpreter acquisition, so a
//! script can `import c_converter` without it existing on disk:
//!
//! - `c_converter(cmd)` runs a shell command and returns the raw status
//! - `checked(cmd)` raises `CaseTranslatorError` on a negative status
//! - `set_callback(fn)` registers the hook the host calls for each export
//!
//! The callback lives in a process-wide slot. `Py<PyAny>` is GIL-independent
//! and can be stored without holding the GIL, but the GIL must be held when
//! dropping it, so the slot is only cleared from inside `Python::with_gil`.

use std::sync::{Mutex, PoisonError};

use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::PyModule;
use tracing::debug;

use crate::command;

pub const MODULE_NAME: &str = "c_converter";

create_exception!(c_converter, CaseTranslatorError, PyException);

static CALLBACK: Mutex<Option<Py<PyAny>>> = Mutex::new(None);

#[pyfunction]
#[pyo3(name = "c_converter")]
fn run_command(py: Python<'_>, cmd: &str) -> i32 {
    py.allow_threads(|| command::system(cmd))
}

#[pyfunction]
fn checked(py: Python<'_>, cmd: &str) -> PyResult<i32> {
    py.allow_threads(|| command::system_checked(cmd))
        .map_err(|e| CaseTranslatorError::new_err(e.to_string()))
}

#[pyfunction]
fn set_callback(callable: Bound<'_, PyAny>) -> PyResult<()> {
    if !callable.is_callable() {
        return Err(PyTypeError::new_err("parameter must be callable"));
    }
    debug!("translator callback registered");
    let previous = CALLBACK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(callable.unbind());
    drop(previous);
    Ok(())
}

/// Build the module and register it in `sys.modules`, replacing any
/// previous instance.
pub fn install(py: Python<'_>) -> PyResult<()> {
    let module = PyModule::new(py, MODULE_NAME)?;
    module.add_function(wrap_pyfunction!(run_command, &module)?)?;
    module.add_function(wrap_pyfunction!(checked, &module)?)?;
    module.add_function(wrap_pyfunction!(set_callback, &module)?)?;
    module.add("CaseTranslatorError", py.get_type::<CaseTranslatorError>())?;

    py.import("sys")?
        .getattr("modules")?
        .set_item(MODULE_NAME, module)?;
    Ok(())
}

/// The callable registered by the script, if any.
pub fn callback(py: Python<'_>) -> Option<Py<PyAny>> {
    CALLBACK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(|cb| cb.clone_ref(py))
}

/// Drop the registered callable. The `py` token proves the GIL is held.
pub fn clear_callback(_py: Python<'_>) {
    let previous = CALLBACK.lock().unwrap_or_else(PoisonError::into_inner).take();
    drop(previous);
}
