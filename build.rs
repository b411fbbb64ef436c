use std::process::Command;

fn main() {
    // The host binary and the cdylib both link libpython directly, so the
    // linker needs Python's LIBDIR when it is not on the default path.

    if let Ok(output) = Command::new("python3").args(["--version"]).output() {
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:warning=Embedding {}", version.trim());
        }
    }

    if let Ok(output) = Command::new("python3")
        .args([
            "-c",
            "import sysconfig; print(sysconfig.get_config_var('LIBDIR'))",
        ])
        .output()
    {
        if output.status.success() {
            let libdir = String::from_utf8_lossy(&output.stdout);
            let libdir = libdir.trim();
            if !libdir.is_empty() && libdir != "None" {
                println!("cargo:rustc-link-search=native={libdir}");
                // Lets the test and host binaries find libpython at run time.
                let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
                if target_os == "linux" || target_os == "macos" {
                    println!("cargo:rustc-link-arg=-Wl,-rpath,{libdir}");
                }
            }
        }
    }
}
