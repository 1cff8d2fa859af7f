use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_MONITOR_INTERVAL_SECS, DEFAULT_MONITOR_TIMEOUT_MS,
    DEFAULT_REFERENCE_URL,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Endpoint hit with a HEAD request on every measurement
    pub reference_url: String,
    pub timeout_ms: u64,
    /// Period used by callers that poll the endpoint on a timer
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reference_url: String::from(DEFAULT_REFERENCE_URL),
            timeout_ms: DEFAULT_MONITOR_TIMEOUT_MS,
            interval_secs: DEFAULT_MONITOR_INTERVAL_SECS,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !self.reference_url.starts_with("http://") && !self.reference_url.starts_with("https://")
        {
            return Err(ConfigError::monitor(format!(
                "monitor.reference_url must be an http(s) URL, got '{}'",
                self.reference_url
            )));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::monitor("monitor.timeout_ms must be > 0"));
        }

        if self.interval_secs == 0 {
            return Err(ConfigError::monitor("monitor.interval_secs must be > 0"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
