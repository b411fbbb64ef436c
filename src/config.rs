//! Host configuration, loaded from TOML or taken from the defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::convert::{self, ExportValue};
use crate::error::{HostError, Result};

/// Script run when nothing else is configured.
pub const DEFAULT_SCRIPT: &str = "case_translator.py";

/// A module imported into the namespace under `alias`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModuleBinding {
    pub alias: String,
    pub module: String,
}

impl ModuleBinding {
    pub fn new(alias: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            module: module.into(),
        }
    }
}

/// A value exported by the native tool, still in its string form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub value: String,
}

impl ExportSpec {
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            value: value.into(),
        }
    }

    pub fn convert(&self) -> Result<ExportValue> {
        Ok(convert::convert_property(&self.type_tag, &self.value)?)
    }
}

/// Script host configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Translator script executed against the namespace.
    pub script: PathBuf,
    /// Directories prepended to `sys.path`.
    pub search_paths: Vec<PathBuf>,
    /// Modules bound into the namespace before the script runs.
    pub modules: Vec<ModuleBinding>,
    /// Values handed to the script under `exports`.
    pub exports: Vec<ExportSpec>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from(DEFAULT_SCRIPT),
            search_paths: vec![PathBuf::from(".")],
            modules: vec![
                ModuleBinding::new("case", "case"),
                ModuleBinding::new("NLG", "NLG"),
                ModuleBinding::new("ctypes", "ctypes"),
            ],
            exports: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Load a TOML config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| HostError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_case_translator() {
        let config = HostConfig::default();
        assert_eq!(config.script, PathBuf::from("case_translator.py"));
        let aliases: Vec<_> = config.modules.iter().map(|m| m.alias.as_str()).collect();
        assert_eq!(aliases, ["case", "NLG", "ctypes"]);
        assert!(config.exports.is_empty());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(HostConfig::from_toml("").unwrap(), HostConfig::default());
    }

    #[test]
    fn parses_modules_and_exports() {
        let config = HostConfig::from_toml(
            r#"
            script = "translate.py"
            search_paths = ["lib"]

            [[modules]]
            alias = "case"
            module = "case_python_api.case"

            [[exports]]
            name = "object_name"
            type = "str"
            value = "core_Tool"

            [[exports]]
            name = "param_2"
            type = "float"
            value = "6.35"
            "#,
        )
        .unwrap();

        assert_eq!(config.script, PathBuf::from("translate.py"));
        assert_eq!(config.modules, [ModuleBinding::new("case", "case_python_api.case")]);
        assert_eq!(config.exports.len(), 2);
        assert_eq!(config.exports[1].convert().unwrap(), ExportValue::Float(6.35));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = HostConfig::from_toml("scrpt = \"x.py\"").unwrap_err();
        assert!(matches!(err, HostError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = HostConfig::load("/nonexistent/case-host.toml").unwrap_err();
        assert!(matches!(err, HostError::ConfigRead { .. }));
    }
}
