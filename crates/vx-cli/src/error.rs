use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;
use vx_config::ConfigError;
use vx_core::SupervisorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {source} {location}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("Proxy error: {source} {location}")]
    Supervisor {
        #[source]
        source: SupervisorError,
        location: ErrorLocation,
    },

    #[error("Unknown DNS server '{value}' (expected a catalog id, 'auto' or host:port) {location}")]
    UnknownDns {
        value: String,
        location: ErrorLocation,
    },

    #[error("Failed to initialize logging: {message} {location}")]
    Logging {
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON serialization error: {source} {location}")]
    Json {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn unknown_dns(value: impl Into<String>) -> Self {
        Self::UnknownDns {
            value: value.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// What the user can do about it, when there is something to say.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::Supervisor { source, .. } => Some(source.recovery_hint()),
            Self::Config { .. } => Some(
                "Fix the setting in .vexar/config.toml or the VX_* environment variable.",
            ),
            Self::UnknownDns { .. } => Some("Run `vexar servers` to list the catalog ids."),
            Self::Logging { .. } | Self::Json { .. } => None,
        }
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SupervisorError> for CliError {
    #[track_caller]
    fn from(source: SupervisorError) -> Self {
        Self::Supervisor {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
