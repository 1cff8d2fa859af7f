//! Supervision of the local DPI-bypass proxy plus the latency measurements
//! that pick its resolver and report connection quality.

mod error;
mod port;

pub mod dns;
pub mod logs;
pub mod monitor;
pub mod supervisor;

#[cfg(test)]
mod tests;

pub use dns::{DnsServer, LatencyProber, LatencyResult, UNREACHABLE_LATENCY_MS};
pub use error::{Result as SupervisorResult, SupervisorError};
pub use logs::{LogAggregator, LogEntry};
pub use monitor::{ConnectionQuality, EndpointLatencyMonitor};
pub use port::PortAllocator;
pub use supervisor::{HostControl, ProxySupervisor, SupervisorState, SystemHost};
