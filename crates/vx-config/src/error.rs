use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{category} error: {message} {location}")]
    Generic {
        category: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Create a config error
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Config",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a supervisor settings error
    #[track_caller]
    pub fn supervisor<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Supervisor",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a log buffer settings error
    #[track_caller]
    pub fn log_buffer<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Log buffer",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a latency probe settings error
    #[track_caller]
    pub fn probe<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Probe",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a reference monitor settings error
    #[track_caller]
    pub fn monitor<S: Into<String>>(message: S) -> Self {
        ConfigError::Generic {
            category: "Monitor",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
