//! Conversion of a tool's exported values into Python objects.
//!
//! Native tools export their properties as strings tagged with a type
//! (`int`, `datetime`, `list:str`, ...). They are converted to typed
//! `ExportValue`s here, then into Python objects for the translator script.

use std::ffi::CStr;
use std::os::raw::c_char;

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyList, PyString};

use crate::error::ConvertError;

/// Separator between items of a `list:` property.
pub const LIST_SEPARATOR: &str = "[ | ]";

/// Timestamp layout used by exported `datetime` properties.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

const LIST_PREFIX: &str = "list:";

// ==================== Export Values ====================

/// A typed value exported by a native tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    List(Vec<ExportValue>),
}

impl ExportValue {
    /// Build the matching Python object (`datetime.datetime` for timestamps).
    pub fn to_python<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let obj = match self {
            ExportValue::Str(s) => PyString::new(py, s).into_any(),
            ExportValue::Int(v) => (*v).into_pyobject(py)?.into_any(),
            ExportValue::Float(v) => (*v).into_pyobject(py)?.into_any(),
            ExportValue::Bool(b) => PyBool::new(py, *b).to_owned().into_any(),
            ExportValue::DateTime(dt) => (*dt).into_pyobject(py)?.into_any(),
            ExportValue::List(items) => {
                let items = items
                    .iter()
                    .map(|item| item.to_python(py))
                    .collect::<PyResult<Vec<_>>>()?;
                PyList::new(py, items)?.into_any()
            }
        };
        Ok(obj)
    }
}

/// Convert a raw exported string according to its type tag.
///
/// `list:<tag>` splits on [`LIST_SEPARATOR`] and converts every item with
/// `<tag>`. Lists do not nest.
pub fn convert_property(type_tag: &str, raw: &str) -> Result<ExportValue, ConvertError> {
    match type_tag.strip_prefix(LIST_PREFIX) {
        Some(item_tag) if item_tag.starts_with(LIST_PREFIX) => {
            Err(ConvertError::UnknownType(type_tag.to_owned()))
        }
        Some(item_tag) => raw
            .trim()
            .split(LIST_SEPARATOR)
            .map(|item| convert_scalar(item_tag, item))
            .collect::<Result<Vec<_>, _>>()
            .map(ExportValue::List),
        None => convert_scalar(type_tag, raw),
    }
}

fn convert_scalar(type_tag: &str, raw: &str) -> Result<ExportValue, ConvertError> {
    match type_tag {
        "str" => Ok(ExportValue::Str(raw.trim_matches('"').to_owned())),
        "bool" => match raw {
            "True" | "true" => Ok(ExportValue::Bool(true)),
            "False" | "false" => Ok(ExportValue::Bool(false)),
            _ => Err(ConvertError::InvalidBool(raw.to_owned())),
        },
        "int" => raw
            .trim()
            .parse()
            .map(ExportValue::Int)
            .map_err(|_| ConvertError::InvalidInt(raw.to_owned())),
        "float" => raw
            .trim()
            .parse()
            .map(ExportValue::Float)
            .map_err(|_| ConvertError::InvalidFloat(raw.to_owned())),
        "datetime" => NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
            .map(ExportValue::DateTime)
            .map_err(|_| ConvertError::InvalidDateTime(raw.to_owned())),
        other => Err(ConvertError::UnknownType(other.to_owned())),
    }
}

// ==================== C String Helpers ====================

/// Safely convert a `*const c_char` to `&str`.
///
/// # Safety
/// The pointer must be valid, null-terminated, and point to valid UTF-8.
pub unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err("Null string pointer".into());
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| format!("Invalid UTF-8: {e}"))
}

// ==================== Python Error Formatting ====================

/// Convert a `PyErr` into a human-readable error string,
/// including traceback if available.
pub fn pyerr_to_string(py: Python<'_>, err: PyErr) -> String {
    let msg = format!("{err}");
    if let Some(tb) = err.traceback(py) {
        if let Ok(formatted) = tb.format() {
            return format!("{formatted}{msg}");
        }
    }
    msg
}
