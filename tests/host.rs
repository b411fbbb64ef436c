// End-to-end runs of the script host against throwaway scripts.
//
// The real `case` and `NLG` packages are not installed in test
// environments, so stdlib modules are bound under their aliases.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use case_host::{ExportSpec, HostConfig, HostError, ModuleBinding, ScriptHost};
use pyo3::prelude::*;

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

fn write_script(dir: &Path, source: &str) -> PathBuf {
    let path = dir.join("case_translator.py");
    fs::write(&path, source).unwrap();
    path
}

fn stdlib_config(script: PathBuf) -> HostConfig {
    HostConfig {
        script,
        search_paths: Vec::new(),
        modules: vec![
            ModuleBinding::new("case", "json"),
            ModuleBinding::new("NLG", "string"),
            ModuleBinding::new("ctypes", "ctypes"),
        ],
        exports: Vec::new(),
    }
}

#[test]
fn empty_script_runs_to_completion() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "");

    let report = ScriptHost::new(stdlib_config(script)).run().unwrap();
    assert_eq!(report.modules, ["case", "NLG", "ctypes"]);
    assert_eq!(report.exports, 0);
    assert_eq!(report.dispatched, 0);
}

#[test]
fn exports_are_bound_and_dispatched_in_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        r#"
import c_converter

seen = []
assert exports["object_name"] == "core_Tool"
assert exports["param_1"] == 4
assert abs(exports["param_2"] - 6.35) < 1e-9
assert exports["started"].year == 2020
assert exports["tags"] == ["a", "b"]
c_converter.set_callback(lambda name, value: seen.append(name))
"#,
    );

    let mut config = stdlib_config(script);
    config.exports = vec![
        ExportSpec::new("object_name", "str", "\"core_Tool\""),
        ExportSpec::new("param_1", "int", "4"),
        ExportSpec::new("param_2", "float", "6.35"),
        ExportSpec::new("started", "datetime", "2020-05-01T10:00:00.000Z"),
        ExportSpec::new("tags", "list:str", "a[ | ]b"),
    ];

    let (report, seen) = ScriptHost::new(config)
        .execute(|ns| ns.get("seen").unwrap().extract::<Vec<String>>().unwrap())
        .unwrap();

    assert_eq!(report.exports, 5);
    assert_eq!(report.dispatched, 5);
    assert_eq!(seen, ["object_name", "param_1", "param_2", "started", "tags"]);
}

#[test]
fn no_exports_key_without_exports() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "pass\n");

    let (_, has_exports) = ScriptHost::new(stdlib_config(script))
        .execute(|ns| ns.contains("exports"))
        .unwrap();
    assert!(!has_exports);
}

#[test]
fn callback_error_names_the_export() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "import c_converter\n\
         def reject(name, value):\n    raise RuntimeError('no ' + name)\n\
         c_converter.set_callback(reject)\n",
    );
    let mut config = stdlib_config(script);
    config.exports = vec![ExportSpec::new("param_1", "int", "4")];

    match ScriptHost::new(config).run().unwrap_err() {
        HostError::Callback { export, message } => {
            assert_eq!(export, "param_1");
            assert!(message.contains("no param_1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bad_export_fails_before_the_script_runs() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let script = write_script(
        dir.path(),
        &format!("open({:?}, 'w').close()\n", marker.to_string_lossy()),
    );
    let mut config = stdlib_config(script);
    config.exports = vec![ExportSpec::new("flag", "bool", "maybe")];

    let err = ScriptHost::new(config).run().unwrap_err();
    assert!(matches!(err, HostError::Convert(_)));
    assert!(!marker.exists());
}

#[test]
fn missing_script_is_reported() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("case_translator.py");

    let err = ScriptHost::new(stdlib_config(missing.clone())).run().unwrap_err();
    match err {
        HostError::ScriptNotFound(path) => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_import_releases_the_interpreter() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "");

    let mut broken = stdlib_config(script.clone());
    broken.modules[1] = ModuleBinding::new("NLG", "no_such_module_for_case_host");
    let err = ScriptHost::new(broken).run().unwrap_err();
    assert!(matches!(err, HostError::Import { .. }));

    // A second run can acquire the interpreter again.
    ScriptHost::new(stdlib_config(script)).run().unwrap();
}

#[test]
fn search_paths_make_local_modules_importable() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("case_stub.py"), "VERSION = '0.1'\n").unwrap();
    let script = write_script(dir.path(), "version = case.VERSION\n");

    let mut config = stdlib_config(script);
    config.search_paths = vec![dir.path().to_path_buf()];
    config.modules[0] = ModuleBinding::new("case", "case_stub");

    let (_, version) = ScriptHost::new(config)
        .execute(|ns| ns.get("version").unwrap().extract::<String>().unwrap())
        .unwrap();
    assert_eq!(version, "0.1");
}

#[test]
fn search_paths_do_not_outlive_their_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("case_host_run_local.py"), "VERSION = '0.2'\n").unwrap();
    let script = write_script(dir.path(), "");

    let mut first = stdlib_config(script.clone());
    first.search_paths = vec![dir.path().to_path_buf()];
    first.modules[0] = ModuleBinding::new("case", "case_host_run_local");
    ScriptHost::new(first).run().unwrap();

    let mut second = stdlib_config(script);
    second.modules[0] = ModuleBinding::new("case", "case_host_run_local");
    match ScriptHost::new(second).run().unwrap_err() {
        HostError::Import { module, .. } => assert_eq!(module, "case_host_run_local"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn binary_exits_zero_on_empty_script() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "");
    fs::write(
        dir.path().join("case-host.toml"),
        r#"
[[modules]]
alias = "case"
module = "json"

[[modules]]
alias = "NLG"
module = "string"

[[modules]]
alias = "ctypes"
module = "ctypes"
"#,
    )
    .unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_case-host"))
        .current_dir(dir.path())
        .args(["--config", "case-host.toml"])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn binary_fails_without_script() {
    let dir = tempfile::tempdir().unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_case-host"))
        .current_dir(dir.path())
        .arg("missing.py")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
