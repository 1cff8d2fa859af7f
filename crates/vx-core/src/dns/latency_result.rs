use std::collections::HashMap;

use serde::Serialize;

/// Per-server latency in milliseconds for one probing round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LatencyResult {
    latencies: HashMap<String, u64>,
}

impl LatencyResult {
    pub fn get(&self, server_id: &str) -> Option<u64> {
        self.latencies.get(server_id).copied()
    }

    pub fn insert(&mut self, server_id: impl Into<String>, latency_ms: u64) {
        self.latencies.insert(server_id.into(), latency_ms);
    }

    pub fn clear(&mut self) {
        self.latencies.clear();
    }

    pub fn len(&self) -> usize {
        self.latencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.latencies.iter().map(|(id, ms)| (id.as_str(), *ms))
    }
}
