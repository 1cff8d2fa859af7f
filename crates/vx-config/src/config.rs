use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR,
    LogBufferConfig, LoggingConfig, MonitorConfig, ProbeConfig, SupervisorConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub supervisor: SupervisorConfig,
    pub log_buffer: LogBufferConfig,
    pub probe: ProbeConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for VX_CONFIG_DIR env var, else use ./.vexar/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply VX_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: VX_CONFIG_DIR env var > ./.vexar/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.supervisor.validate()?;
        self.log_buffer.validate()?;
        self.probe.validate()?;
        self.monitor.validate()?;

        let log_dir = Path::new(&self.logging.dir);
        if self.logging.file && (log_dir.is_absolute() || self.logging.dir.contains("..")) {
            return Err(ConfigError::config(
                "logging.dir must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Absolute path of the rotated log directory.
    pub fn log_dir(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.logging.dir))
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  supervisor: {} on {} ports {}-{} (system proxy: {})",
            self.supervisor.binary_name,
            self.supervisor.listen_host,
            self.supervisor.port_range_start,
            self.supervisor.port_range_end,
            self.supervisor.system_proxy
        );
        info!(
            "  recovery: max {} crashes per {}s, restart after {}ms, settle {}ms",
            self.supervisor.max_crashes,
            self.supervisor.crash_window_secs,
            self.supervisor.restart_delay_ms,
            self.supervisor.settle_delay_ms
        );
        info!(
            "  log_buffer: flush={}ms, trim {} -> {}",
            self.log_buffer.flush_interval_ms,
            self.log_buffer.max_entries,
            self.log_buffer.retain_entries
        );
        info!(
            "  probe: port {} timeout={}ms",
            self.probe.port, self.probe.timeout_ms
        );
        info!(
            "  monitor: {} timeout={}ms every {}s",
            self.monitor.reference_url, self.monitor.timeout_ms, self.monitor.interval_secs
        );
        info!(
            "  logging: {} (file: {})",
            self.logging.level, self.logging.file
        );
    }

    fn apply_env_overrides(&mut self) {
        // Supervisor
        Self::apply_env_string("VX_BINARY_NAME", &mut self.supervisor.binary_name);
        Self::apply_env_paths("VX_SEARCH_PATHS", &mut self.supervisor.search_paths);
        Self::apply_env_string("VX_LISTEN_HOST", &mut self.supervisor.listen_host);
        Self::apply_env_parse("VX_PORT_RANGE_START", &mut self.supervisor.port_range_start);
        Self::apply_env_parse("VX_PORT_RANGE_END", &mut self.supervisor.port_range_end);
        Self::apply_env_string("VX_CHILD_LOG_LEVEL", &mut self.supervisor.child_log_level);
        Self::apply_env_bool("VX_SYSTEM_PROXY", &mut self.supervisor.system_proxy);
        Self::apply_env_parse("VX_SETTLE_DELAY_MS", &mut self.supervisor.settle_delay_ms);
        Self::apply_env_parse("VX_RESTART_DELAY_MS", &mut self.supervisor.restart_delay_ms);
        Self::apply_env_parse("VX_MAX_CRASHES", &mut self.supervisor.max_crashes);
        Self::apply_env_parse(
            "VX_CRASH_WINDOW_SECS",
            &mut self.supervisor.crash_window_secs,
        );
        Self::apply_env_parse("VX_STABLE_RUN_SECS", &mut self.supervisor.stable_run_secs);
        Self::apply_env_parse(
            "VX_STOP_TIMEOUT_SECS",
            &mut self.supervisor.stop_timeout_secs,
        );

        // Log buffer
        Self::apply_env_parse(
            "VX_LOG_FLUSH_INTERVAL_MS",
            &mut self.log_buffer.flush_interval_ms,
        );
        Self::apply_env_parse("VX_LOG_MAX_ENTRIES", &mut self.log_buffer.max_entries);
        Self::apply_env_parse("VX_LOG_RETAIN_ENTRIES", &mut self.log_buffer.retain_entries);

        // Probe
        Self::apply_env_parse("VX_PROBE_PORT", &mut self.probe.port);
        Self::apply_env_parse("VX_PROBE_TIMEOUT_MS", &mut self.probe.timeout_ms);

        // Monitor
        Self::apply_env_string("VX_MONITOR_URL", &mut self.monitor.reference_url);
        Self::apply_env_parse("VX_MONITOR_TIMEOUT_MS", &mut self.monitor.timeout_ms);
        Self::apply_env_parse("VX_MONITOR_INTERVAL_SECS", &mut self.monitor.interval_secs);

        // Logging
        Self::apply_env_parse("VX_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("VX_LOG_DIR", &mut self.logging.dir);
        Self::apply_env_bool("VX_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for PATH-style lists
    fn apply_env_paths(var_name: &str, target: &mut Vec<String>) {
        if let Some(val) = std::env::var_os(var_name) {
            *target = std::env::split_paths(&val)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
        }
    }
}
