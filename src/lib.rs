//! case-host: embeds Python so a native tool can hand its exported values to
//! a CASE translator script.
//!
//! The host acquires the interpreter, binds the `case`, `NLG` and `ctypes`
//! modules into a fresh namespace, runs `case_translator.py` against it and
//! releases the interpreter. Scripts can `import c_converter` to run shell
//! commands or to register a callback that receives each export.
//!
//! The crate also builds a `cdylib` with C ABI entry points (`case_host_*`)
//! for tools written in C.

pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod ffi;
pub mod host;
pub mod interpreter;
pub mod namespace;
pub mod native;

pub use config::{ExportSpec, HostConfig, ModuleBinding};
pub use convert::ExportValue;
pub use error::{CommandError, ConvertError, HostError, Result};
pub use host::{RunReport, ScriptHost};
pub use interpreter::Interpreter;
pub use namespace::Namespace;
