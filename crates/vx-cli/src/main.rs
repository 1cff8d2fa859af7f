//! vexar - DPI-bypass proxy supervisor
//!
//! Runs spoofdpi on a free local port, restarts it when it crashes and
//! picks the fastest DNS resolver for it.
//!
//! # Examples
//!
//! ```bash
//! # Rank the DNS catalog
//! vexar probe --pretty
//!
//! # Supervise the proxy with the fastest resolver until Ctrl-C
//! vexar run --dns auto
//!
//! # Watch connection quality
//! vexar latency --watch
//! ```

use std::process::ExitCode;

use clap::Parser;
use vx_cli::{Cli, CliError, CliResult, execute, setup_logging};
use vx_config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let logging = config
        .log_dir()
        .map_err(CliError::from)
        .and_then(|dir| setup_logging(&config.logging, &dir));
    if let Err(e) = logging {
        eprintln!("Warning: {e}");
    }

    config.log_summary();

    match execute(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> CliResult<Config> {
    let config = Config::load()?;
    config.validate()?;
    Ok(config)
}

fn report_error(error: &CliError) {
    eprintln!("Error: {error}");
    if let Some(hint) = error.recovery_hint() {
        eprintln!();
        eprintln!("{hint}");
    }
}
