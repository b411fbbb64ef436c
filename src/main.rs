use std::path::PathBuf;
use std::process::ExitCode;

use case_host::{HostConfig, ScriptHost};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run a CASE translator script inside an embedded Python interpreter.
#[derive(Debug, Parser)]
#[command(name = "case-host", version, about)]
struct Cli {
    /// Translator script (defaults to case_translator.py)
    script: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra directory to prepend to sys.path (repeatable)
    #[arg(long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref().map(HostConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            error!(error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };
    if let Some(script) = cli.script {
        config.script = script;
    }
    config.search_paths.extend(cli.search_paths);

    info!("START");
    let result = ScriptHost::new(config).run();
    info!("STOP");

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "translator run failed");
            ExitCode::FAILURE
        }
    }
}
