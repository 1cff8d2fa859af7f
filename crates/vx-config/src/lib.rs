mod config;
mod error;
mod log_buffer_config;
mod log_level;
mod logging_config;
mod monitor_config;
mod probe_config;
mod supervisor_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_buffer_config::LogBufferConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use monitor_config::MonitorConfig;
pub use probe_config::ProbeConfig;
pub use supervisor_config::SupervisorConfig;

const CONFIG_DIR_ENV: &str = "VX_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".vexar";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_BINARY_NAME: &str = "spoofdpi";
const DEFAULT_SEARCH_PATHS: [&str; 2] = ["/opt/homebrew/bin/spoofdpi", "/usr/local/bin/spoofdpi"];
const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";
const DEFAULT_PORT_RANGE_START: u16 = 8080;
const DEFAULT_PORT_RANGE_END: u16 = 8090;
const DEFAULT_CHILD_LOG_LEVEL: &str = "info";
const DEFAULT_SYSTEM_PROXY: bool = true;
const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
const DEFAULT_RESTART_DELAY_MS: u64 = 1000;
const DEFAULT_MAX_CRASHES: u32 = 3;
const DEFAULT_CRASH_WINDOW_SECS: u64 = 60;
const DEFAULT_STABLE_RUN_SECS: u64 = 5;
const DEFAULT_STOP_TIMEOUT_SECS: u64 = 2;

const DEFAULT_FLUSH_INTERVAL_MS: u64 = 100;
const DEFAULT_MAX_LOG_ENTRIES: usize = 300;
const DEFAULT_RETAIN_LOG_ENTRIES: usize = 200;

const DEFAULT_PROBE_PORT: u16 = 53;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

const DEFAULT_REFERENCE_URL: &str = "https://discord.com/api/v9/gateway";
const DEFAULT_MONITOR_TIMEOUT_MS: u64 = 5000;
const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 10;

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "logs";

const MIN_PORT: u16 = 1024;
