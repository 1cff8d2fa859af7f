//! vx-cli library
//!
//! Command handlers behind the `vexar` binary, exported for tests.

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod handlers;
pub(crate) mod logging;
pub(crate) mod report;

#[cfg(test)]
mod tests;

pub use cli::Cli;
pub use commands::Commands;
pub use error::{CliError, CliResult};
pub use handlers::resolve_selection;
pub use logging::setup_logging;
pub use report::{LatencyReport, ProbeReport, ResetReport, ServerLatency};

use vx_config::Config;

/// Dispatch a parsed command line.
pub async fn execute(cli: &Cli, config: &Config) -> CliResult<()> {
    match &cli.command {
        Commands::Probe => handlers::probe(config, cli.pretty).await,
        Commands::Run { dns } => handlers::run(config, dns).await,
        Commands::Latency { watch } => handlers::latency(config, *watch, cli.pretty).await,
        Commands::ResetProxy => handlers::reset_proxy(cli.pretty),
        Commands::Servers => handlers::servers(cli.pretty),
    }
}
