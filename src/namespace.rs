//! The namespace shared between the host and the translator script.

use std::path::Path;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyString};
use tracing::debug;

use crate::config::ModuleBinding;
use crate::convert;
use crate::error::{HostError, Result};

/// A dictionary used as both globals and locals of the translator script.
pub struct Namespace<'py> {
    dict: Bound<'py, PyDict>,
}

impl<'py> Namespace<'py> {
    /// Create an empty namespace.
    pub fn new(py: Python<'py>) -> Self {
        Self {
            dict: PyDict::new(py),
        }
    }

    pub fn py(&self) -> Python<'py> {
        self.dict.py()
    }

    pub fn dict(&self) -> &Bound<'py, PyDict> {
        &self.dict
    }

    /// Import every module and bind it under its alias.
    ///
    /// Stops at the first import that fails; nothing after it is bound.
    pub fn bind_modules(&self, bindings: &[ModuleBinding]) -> Result<()> {
        let py = self.py();
        for binding in bindings {
            let module = py
                .import(binding.module.as_str())
                .map_err(|e| HostError::Import {
                    module: binding.module.clone(),
                    message: convert::pyerr_to_string(py, e),
                })?;
            self.bind(&binding.alias, module.into_any())?;
            debug!(alias = %binding.alias, module = %binding.module, "module bound");
        }
        Ok(())
    }

    pub fn bind(&self, name: &str, value: Bound<'py, PyAny>) -> Result<()> {
        self.dict
            .set_item(name, value)
            .map_err(|e| HostError::bind(self.py(), name, e))
    }

    pub fn get(&self, name: &str) -> Option<Bound<'py, PyAny>> {
        self.dict.get_item(name).ok().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// String keys currently bound, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.dict
            .keys()
            .iter()
            .filter_map(|key| key.extract::<String>().ok())
            .collect()
    }

    /// Execute a script file with this namespace as globals and locals.
    ///
    /// A missing file is reported before anything runs. The script's own
    /// result is discarded; only a raised exception is surfaced.
    pub fn run_file(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(HostError::ScriptNotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path).map_err(|source| HostError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        let py = self.py();
        self.bind("__file__", PyString::new(py, &path.to_string_lossy()).into_any())?;
        self.bind("__name__", PyString::new(py, "__main__").into_any())?;

        debug!(script = %path.display(), "running script");
        self.exec_source(source, path).map_err(|e| HostError::Script {
            path: path.to_path_buf(),
            message: convert::pyerr_to_string(py, e),
        })
    }

    /// Compile under the script's own file name so tracebacks point at it.
    fn exec_source(&self, source: String, path: &Path) -> PyResult<()> {
        let builtins = self.py().import("builtins")?;
        let filename = path.to_string_lossy().into_owned();
        let code = builtins.call_method1("compile", (source, filename, "exec"))?;
        builtins.call_method1("exec", (code, &self.dict, &self.dict))?;
        Ok(())
    }
}
