use serde::Serialize;

const GOOD_BELOW_MS: u64 = 100;
const FAIR_BELOW_MS: u64 = 200;

/// Coarse rating of the reference endpoint latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    Good,
    Fair,
    Poor,
    /// No successful measurement
    Unknown,
}

impl ConnectionQuality {
    pub fn from_latency(latency_ms: Option<u64>) -> Self {
        match latency_ms {
            None => Self::Unknown,
            Some(ms) if ms < GOOD_BELOW_MS => Self::Good,
            Some(ms) if ms < FAIR_BELOW_MS => Self::Fair,
            Some(_) => Self::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
