use crate::{ConfigError, ConfigErrorResult, DEFAULT_PROBE_PORT, DEFAULT_PROBE_TIMEOUT_MS};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// TCP port connected to on every resolver
    pub port: u16,
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PROBE_PORT,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port == 0 {
            return Err(ConfigError::probe("probe.port must be > 0"));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::probe("probe.timeout_ms must be > 0"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
