//! JSON documents printed by the commands.

use serde::Serialize;
use vx_core::{ConnectionQuality, DnsServer, LatencyResult, UNREACHABLE_LATENCY_MS};

#[derive(Debug, Serialize)]
pub struct ServerLatency {
    pub id: String,
    pub name: String,
    pub address: String,
    /// `None` when the server did not answer in time
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub servers: Vec<ServerLatency>,
    pub best: Option<String>,
}

impl ProbeReport {
    /// One row per probed server, in catalog order.
    pub fn new(catalog: &[DnsServer], results: &LatencyResult, best: Option<&DnsServer>) -> Self {
        let servers = catalog
            .iter()
            .filter(|server| !server.is_automatic())
            .map(|server| ServerLatency {
                id: server.id.clone(),
                name: server.name.clone(),
                address: server.address.clone(),
                latency_ms: results
                    .get(&server.id)
                    .filter(|ms| *ms < UNREACHABLE_LATENCY_MS),
            })
            .collect();

        Self {
            servers,
            best: best.map(|server| server.id.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatencyReport {
    pub url: String,
    pub latency_ms: Option<u64>,
    pub quality: ConnectionQuality,
}

impl LatencyReport {
    pub fn new(url: &str, latency_ms: Option<u64>) -> Self {
        Self {
            url: url.to_string(),
            latency_ms,
            quality: ConnectionQuality::from_latency(latency_ms),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetReport {
    pub services_reset: usize,
}
