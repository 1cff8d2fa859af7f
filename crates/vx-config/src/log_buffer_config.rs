use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_MAX_LOG_ENTRIES,
    DEFAULT_RETAIN_LOG_ENTRIES,
};

use std::time::Duration;

use serde::Deserialize;

/// Throttling and retention for child process output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogBufferConfig {
    /// Coalescing window for flushes
    pub flush_interval_ms: u64,
    /// Trim is triggered once the visible list grows past this
    pub max_entries: usize,
    /// Entries kept after a trim
    pub retain_entries: usize,
}

impl Default for LogBufferConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            max_entries: DEFAULT_MAX_LOG_ENTRIES,
            retain_entries: DEFAULT_RETAIN_LOG_ENTRIES,
        }
    }
}

impl LogBufferConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::log_buffer(
                "log_buffer.flush_interval_ms must be > 0",
            ));
        }

        if self.retain_entries == 0 || self.retain_entries >= self.max_entries {
            return Err(ConfigError::log_buffer(format!(
                "log_buffer.retain_entries must be 1-{}, got {}",
                self.max_entries.saturating_sub(1),
                self.retain_entries
            )));
        }

        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
