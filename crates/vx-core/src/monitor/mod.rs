//! Reference endpoint latency and the quality rating derived from it.

mod connection_quality;
mod endpoint_monitor;

pub use connection_quality::ConnectionQuality;
pub use endpoint_monitor::EndpointLatencyMonitor;
