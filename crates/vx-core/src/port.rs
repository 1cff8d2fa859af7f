//! Port allocation and availability checking.

use crate::{SupervisorError, SupervisorResult};

use std::net::{Ipv4Addr, TcpListener};
use std::ops::RangeInclusive;

use tracing::debug;
use vx_config::SupervisorConfig;

const DEFAULT_RANGE: (u16, u16) = (8080, 8090);

/// Scans a closed port range for the first port that can be bound.
///
/// This is a check, not a reservation: the probe socket is released
/// before the port is handed to the proxy, so another process can still
/// take it in between.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    start: u16,
    end: u16,
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE.0, DEFAULT_RANGE.1)
    }
}

impl PortAllocator {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        let (start, end) = config.port_range();
        Self::new(start, end)
    }

    pub fn range(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }

    /// Find the first available port, scanning in ascending order.
    pub fn find_available(&self) -> SupervisorResult<u16> {
        for port in self.range() {
            if Self::is_available(port) {
                debug!("Found available port: {port}");
                return Ok(port);
            }
        }

        Err(SupervisorError::no_ports_available(self.start, self.end))
    }

    /// Check if a port is available for binding.
    ///
    /// Attempts to bind to 0.0.0.0:port. If successful,
    /// the port is available. The socket is immediately
    /// released when the listener is dropped.
    pub fn is_available(port: u16) -> bool {
        TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).is_ok()
    }
}
