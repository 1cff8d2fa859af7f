use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_BINARY_NAME, DEFAULT_CHILD_LOG_LEVEL,
    DEFAULT_CRASH_WINDOW_SECS, DEFAULT_LISTEN_HOST, DEFAULT_MAX_CRASHES, DEFAULT_PORT_RANGE_END,
    DEFAULT_PORT_RANGE_START, DEFAULT_RESTART_DELAY_MS, DEFAULT_SEARCH_PATHS,
    DEFAULT_SETTLE_DELAY_MS, DEFAULT_STABLE_RUN_SECS, DEFAULT_STOP_TIMEOUT_SECS,
    DEFAULT_SYSTEM_PROXY, MIN_PORT,
};

use std::time::Duration;

use serde::Deserialize;

/// Settings for launching and supervising the proxy binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Executable name; also the exact process name killed before each start
    pub binary_name: String,
    /// Well-known install locations, searched in order
    pub search_paths: Vec<String>,
    /// Address the proxy listens on
    pub listen_host: String,
    pub port_range_start: u16,
    pub port_range_end: u16,
    /// Value passed to the child's `--log-level`
    pub child_log_level: String,
    /// Pass `--system-proxy` so the child configures the OS proxy itself
    pub system_proxy: bool,
    /// Pause after killing stale instances, before launching
    pub settle_delay_ms: u64,
    /// Delay between an unexpected exit and the automatic restart
    pub restart_delay_ms: u64,
    /// Restarts allowed inside one crash window
    pub max_crashes: u32,
    /// Idle time after the last crash that resets the crash counter
    pub crash_window_secs: u64,
    /// Continuous running time that resets the crash counter
    pub stable_run_secs: u64,
    /// Upper bound for `stop_blocking`
    pub stop_timeout_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            binary_name: String::from(DEFAULT_BINARY_NAME),
            search_paths: DEFAULT_SEARCH_PATHS.iter().map(|p| p.to_string()).collect(),
            listen_host: String::from(DEFAULT_LISTEN_HOST),
            port_range_start: DEFAULT_PORT_RANGE_START,
            port_range_end: DEFAULT_PORT_RANGE_END,
            child_log_level: String::from(DEFAULT_CHILD_LOG_LEVEL),
            system_proxy: DEFAULT_SYSTEM_PROXY,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
            max_crashes: DEFAULT_MAX_CRASHES,
            crash_window_secs: DEFAULT_CRASH_WINDOW_SECS,
            stable_run_secs: DEFAULT_STABLE_RUN_SECS,
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.binary_name.trim().is_empty() {
            return Err(ConfigError::supervisor("supervisor.binary_name must not be empty"));
        }

        if self.port_range_start < MIN_PORT {
            return Err(ConfigError::supervisor(format!(
                "supervisor.port_range_start must be >= {}, got {}",
                MIN_PORT, self.port_range_start
            )));
        }

        if self.port_range_start > self.port_range_end {
            return Err(ConfigError::supervisor(format!(
                "supervisor port range is empty: {} > {}",
                self.port_range_start, self.port_range_end
            )));
        }

        if self.max_crashes == 0 {
            return Err(ConfigError::supervisor("supervisor.max_crashes must be >= 1"));
        }

        if self.stop_timeout_secs == 0 {
            return Err(ConfigError::supervisor(
                "supervisor.stop_timeout_secs must be > 0",
            ));
        }

        Ok(())
    }

    pub fn port_range(&self) -> (u16, u16) {
        (self.port_range_start, self.port_range_end)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn crash_window(&self) -> Duration {
        Duration::from_secs(self.crash_window_secs)
    }

    pub fn stable_run(&self) -> Duration {
        Duration::from_secs(self.stable_run_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}
