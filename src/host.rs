//! The script host: acquire the interpreter, bind modules and exports,
//! run the translator script, hand each export to the script's callback,
//! release the interpreter.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::convert::{self, ExportValue};
use crate::error::{HostError, Result};
use crate::interpreter::Interpreter;
use crate::namespace::Namespace;
use crate::native;

/// Namespace key holding the tool's exported values.
pub const EXPORTS_KEY: &str = "exports";

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Module aliases bound before the script ran.
    pub modules: Vec<String>,
    /// Number of exports bound under [`EXPORTS_KEY`].
    pub exports: usize,
    /// Exports passed to a callback registered by the script.
    pub dispatched: usize,
}

pub struct ScriptHost {
    config: HostConfig,
}

impl ScriptHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Run the configured script once.
    pub fn run(&self) -> Result<RunReport> {
        self.execute(|_| ()).map(|(report, ())| report)
    }

    /// Run the configured script, then call `inspect` with the namespace
    /// before the interpreter is released.
    pub fn execute<R>(
        &self,
        inspect: impl for<'py> FnOnce(&Namespace<'py>) -> R,
    ) -> Result<(RunReport, R)> {
        // Exports are converted before the interpreter is touched.
        let exports = self
            .config
            .exports
            .iter()
            .map(|spec| -> Result<(String, ExportValue)> {
                Ok((spec.name.clone(), spec.convert()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let interp = Interpreter::acquire(&self.config.search_paths)?;
        let outcome = interp.with(|py| -> Result<(RunReport, R)> {
            let ns = Namespace::new(py);
            ns.bind_modules(&self.config.modules)?;
            bind_exports(&ns, &exports)?;

            info!(script = %self.config.script.display(), "running translator script");
            ns.run_file(&self.config.script)?;

            let dispatched = dispatch_exports(py, &exports)?;
            let report = RunReport {
                modules: self.config.modules.iter().map(|m| m.alias.clone()).collect(),
                exports: exports.len(),
                dispatched,
            };
            Ok((report, inspect(&ns)))
        });
        drop(interp);

        if let Ok((report, _)) = &outcome {
            info!(
                modules = report.modules.len(),
                exports = report.exports,
                dispatched = report.dispatched,
                "translator script finished"
            );
        }
        outcome
    }
}

fn bind_exports(ns: &Namespace<'_>, exports: &[(String, ExportValue)]) -> Result<()> {
    if exports.is_empty() {
        return Ok(());
    }
    let py = ns.py();
    let dict = PyDict::new(py);
    for (name, value) in exports {
        let obj = value
            .to_python(py)
            .map_err(|e| HostError::bind(py, name, e))?;
        dict.set_item(name, obj)
            .map_err(|e| HostError::bind(py, name, e))?;
    }
    ns.bind(EXPORTS_KEY, dict.into_any())
}

/// Call the script's callback once per export, in configuration order.
/// Returns how many exports were dispatched (0 without a callback).
fn dispatch_exports(py: Python<'_>, exports: &[(String, ExportValue)]) -> Result<usize> {
    let Some(callback) = native::callback(py) else {
        debug!("no translator callback registered");
        return Ok(0);
    };
    let callback = callback.bind(py);
    for (name, value) in exports {
        let callback_err = |e: PyErr| HostError::Callback {
            export: name.clone(),
            message: convert::pyerr_to_string(py, e),
        };
        let obj = value.to_python(py).map_err(callback_err)?;
        callback.call1((name.as_str(), obj)).map_err(callback_err)?;
        debug!(export = %name, "export dispatched");
    }
    Ok(exports.len())
}
