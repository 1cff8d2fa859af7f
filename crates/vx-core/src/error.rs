use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Proxy binary not found (searched: {searched}) {location}")]
    BinaryNotFound {
        searched: String,
        location: ErrorLocation,
    },

    #[error("No available port in range {start}-{end} {location}")]
    NoPortsAvailable {
        start: u16,
        end: u16,
        location: ErrorLocation,
    },

    #[error("Failed to start proxy process: {message} {location}")]
    StartFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Proxy crashed {crashes} times in a row, giving up {location}")]
    CrashLoopExceeded {
        crashes: u32,
        location: ErrorLocation,
    },

    #[error("Configuration invalid: {source} {location}")]
    Config {
        #[source]
        source: vx_config::ConfigError,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn binary_not_found(searched: String) -> Self {
        Self::BinaryNotFound {
            searched,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_ports_available(start: u16, end: u16) -> Self {
        Self::NoPortsAvailable {
            start,
            end,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn start_failed<S: Into<String>>(message: S) -> Self {
        Self::StartFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn crash_loop_exceeded(crashes: u32) -> Self {
        Self::CrashLoopExceeded {
            crashes,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether this error is recoverable via retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoPortsAvailable { .. } | Self::Io { .. })
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::BinaryNotFound { .. } => {
                "spoofdpi is not installed. \
                   Install it with `brew install spoofdpi` and try again."
            }
            Self::NoPortsAvailable { .. } => {
                "Every port in the proxy range is in use. \
                   Close the applications holding them or wait and retry."
            }
            Self::StartFailed { .. } => {
                "The operating system refused to launch the proxy. \
                   Check the binary's permissions and the logs."
            }
            Self::CrashLoopExceeded { .. } => {
                "The proxy keeps crashing. \
                   Check the proxy log output, then start it again."
            }
            Self::Config { .. } => {
                "Configuration file has invalid settings. \
                   Check the logs for details or delete the config file to use defaults."
            }
            Self::Io { .. } => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<std::io::Error> for SupervisorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<vx_config::ConfigError> for SupervisorError {
    #[track_caller]
    fn from(source: vx_config::ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
