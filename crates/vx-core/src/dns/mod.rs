//! Resolver catalog and TCP latency probing.

mod dns_server;
mod latency_result;
mod prober;

pub use dns_server::{AUTOMATIC_SERVER_ID, DEFAULT_SERVER_ID, DnsServer};
pub use latency_result::LatencyResult;
pub use prober::{LatencyProber, probe, select_best};

/// Latency recorded for a server that could not be reached in time.
pub const UNREACHABLE_LATENCY_MS: u64 = 9999;
