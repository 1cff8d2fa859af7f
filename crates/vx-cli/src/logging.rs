//! Logging setup with optional file rotation.

use crate::{CliError, CliResult};

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt};
use vx_config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "vexar";
const MAX_LOG_FILES: usize = 7;

/// Setup logging with console and, when enabled, rotating file output.
///
/// # Log Layers
/// - Console: human-readable, on stderr so stdout stays JSON
/// - File: plain text, daily rotation, 7 files kept
///
/// `RUST_LOG` wins over the configured level. Records from the `log`
/// facade are bridged into tracing.
pub fn setup_logging(config: &LoggingConfig, log_dir: &Path) -> CliResult<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stderr);

    let file_layer = if config.file {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| CliError::logging(format!("{}: {e}", log_dir.display())))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(MAX_LOG_FILES)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .build(log_dir)
            .map_err(|e| CliError::logging(e.to_string()))?;

        Some(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file_appender),
        )
    } else {
        None
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::logging(e.to_string()))?;

    // Bridge log to tracing
    tracing_log::LogTracer::init().map_err(|e| CliError::logging(e.to_string()))?;

    Ok(())
}
