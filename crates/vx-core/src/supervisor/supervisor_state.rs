use serde::Serialize;

/// Current state of the proxy process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SupervisorState {
    /// Proxy is not running
    Stopped,
    /// Proxy is being launched
    Starting,
    /// Proxy is running and listening on `port`
    Running { port: u16 },
    /// A stop has been requested
    Stopping,
    /// Proxy crashed too often and won't restart until started again
    CrashLoopExceeded,
}

impl SupervisorState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Running { port } => Some(*port),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running { .. } => "running",
            Self::Stopping => "stopping",
            Self::CrashLoopExceeded => "crash_loop_exceeded",
        }
    }
}
