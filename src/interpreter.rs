//! Scoped ownership of the embedded Python interpreter.
//!
//! The interpreter is process-wide state. `Interpreter::acquire` hands out
//! exclusive access; a second caller blocks until the first `Interpreter`
//! is dropped, with the GIL released while it waits. Dropping it undoes what
//! the run put into the runtime: the translator callback, the `sys.path`
//! entries it inserted and the modules imported from them. CPython itself
//! stays loaded because it cannot be re-initialised after `Py_Finalize`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Once;

use parking_lot::{Mutex, MutexGuard};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use tracing::{debug, info, warn};

use crate::convert;
use crate::error::{HostError, Result};
use crate::native;

static EXCLUSIVE: Mutex<()> = Mutex::new(());
static PREPARE: Once = Once::new();

/// Exclusive handle on the embedded interpreter.
pub struct Interpreter {
    /// `sys.path` entries this acquisition inserted.
    inserted_paths: Vec<PathBuf>,
    /// `sys.modules` keys present before the search paths were added.
    preloaded: HashSet<String>,
    _exclusive: MutexGuard<'static, ()>,
}

impl Interpreter {
    /// Acquire the interpreter, initialising Python on first use.
    ///
    /// `search_paths` are prepended to `sys.path` (skipping ones already
    /// present) so the translator's modules can be imported from them.
    pub fn acquire(search_paths: &[PathBuf]) -> Result<Self> {
        PREPARE.call_once(|| {
            promote_libpython();
            // Embedding mode: no signal handlers installed.
            pyo3::prepare_freethreaded_python();
            info!("python interpreter initialized");
        });

        // The holder needs the GIL to finish, so never wait while holding it.
        let exclusive = Python::with_gil(|py| py.allow_threads(|| EXCLUSIVE.lock()));

        let mut interp = Self {
            inserted_paths: Vec::new(),
            preloaded: HashSet::new(),
            _exclusive: exclusive,
        };
        // On error `interp` is dropped here, which undoes any partial setup.
        Python::with_gil(|py| -> Result<()> {
            interp.preloaded = loaded_modules(py).map_err(|e| HostError::interpreter(py, e))?;
            interp.inserted_paths =
                extend_sys_path(py, search_paths).map_err(|e| HostError::interpreter(py, e))?;
            native::install(py).map_err(|e| HostError::interpreter(py, e))
        })?;

        debug!(search_paths = ?search_paths, "interpreter acquired");
        Ok(interp)
    }

    /// Run `f` with the GIL held.
    pub fn with<R>(&self, f: impl FnOnce(Python<'_>) -> R) -> R {
        Python::with_gil(f)
    }

    fn restore(&self, py: Python<'_>) -> PyResult<()> {
        evict_modules(py, &self.preloaded, &self.inserted_paths)?;
        let sys_path = py.import("sys")?.getattr("path")?;
        let sys_path = sys_path.downcast::<PyList>()?;
        for dir in &self.inserted_paths {
            let entry = path_entry(dir);
            if sys_path.contains(entry.as_str())? {
                sys_path.call_method1("remove", (entry,))?;
            }
        }
        Ok(())
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        Python::with_gil(|py| {
            native::clear_callback(py);
            if let Err(e) = self.restore(py) {
                warn!(error = %convert::pyerr_to_string(py, e), "failed to restore interpreter state");
            }
        });
        debug!("interpreter released");
    }
}

/// Prepend `search_paths` to `sys.path`, returning the ones actually inserted.
fn extend_sys_path(py: Python<'_>, search_paths: &[PathBuf]) -> PyResult<Vec<PathBuf>> {
    let sys_path = py.import("sys")?.getattr("path")?;
    let sys_path = sys_path.downcast::<PyList>()?;
    let mut inserted = Vec::new();
    for dir in search_paths.iter().rev() {
        let entry = path_entry(dir);
        if !sys_path.contains(entry.as_str())? {
            sys_path.insert(0, entry)?;
            inserted.push(dir.clone());
        }
    }
    Ok(inserted)
}

fn loaded_modules(py: Python<'_>) -> PyResult<HashSet<String>> {
    let modules = py.import("sys")?.getattr("modules")?;
    let modules = modules.downcast::<PyDict>()?;
    Ok(modules
        .keys()
        .iter()
        .filter_map(|key| key.extract::<String>().ok())
        .collect())
}

/// Drop modules first imported during this acquisition from one of `roots`.
///
/// Modules loaded from elsewhere (stdlib, site-packages) stay cached: some
/// extension modules cannot be initialised twice in one process.
fn evict_modules(py: Python<'_>, preloaded: &HashSet<String>, roots: &[PathBuf]) -> PyResult<()> {
    if roots.is_empty() {
        return Ok(());
    }
    let roots: Vec<PathBuf> = roots.iter().map(|root| canonical(root)).collect();
    let modules = py.import("sys")?.getattr("modules")?;
    let modules = modules.downcast::<PyDict>()?;

    let mut stale = Vec::new();
    for (name, module) in modules.iter() {
        let Ok(name) = name.extract::<String>() else {
            continue;
        };
        if preloaded.contains(&name) {
            continue;
        }
        let Some(file) = module_file(&module) else {
            continue;
        };
        if roots.iter().any(|root| file.starts_with(root)) {
            stale.push(name);
        }
    }
    for name in &stale {
        modules.del_item(name)?;
    }
    if !stale.is_empty() {
        debug!(modules = ?stale, "evicted run-local modules");
    }
    Ok(())
}

fn module_file(module: &Bound<'_, PyAny>) -> Option<PathBuf> {
    let file: String = module.getattr("__file__").ok()?.extract().ok()?;
    Some(canonical(Path::new(&file)))
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn path_entry(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

/// Re-open libpython with `RTLD_GLOBAL` so C extensions such as `ctypes`
/// resolve Python symbols when this crate is loaded as a shared library.
fn promote_libpython() {
    #[cfg(target_os = "linux")]
    unsafe {
        use libc::{dlopen, RTLD_GLOBAL, RTLD_NOLOAD, RTLD_NOW};
        let candidates: &[&[u8]] = &[
            b"libpython3.so\0",
            b"libpython3.13.so\0",
            b"libpython3.12.so\0",
            b"libpython3.11.so\0",
            b"libpython3.10.so\0",
        ];
        for name in candidates {
            let ptr = dlopen(name.as_ptr().cast(), RTLD_NOW | RTLD_NOLOAD);
            if !ptr.is_null() {
                dlopen(name.as_ptr().cast(), RTLD_NOW | RTLD_GLOBAL);
                break;
            }
        }
    }
}
