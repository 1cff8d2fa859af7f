use crate::monitor::ConnectionQuality;

use std::time::{Duration, Instant};

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::debug;
use vx_config::MonitorConfig;

/// Single-shot round-trip measurement against one reference endpoint.
///
/// Callers drive it from their own timer.
pub struct EndpointLatencyMonitor {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Default for EndpointLatencyMonitor {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

impl EndpointLatencyMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_url(config.reference_url.clone(), config.timeout())
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// HEAD the endpoint, bypassing caches.
    ///
    /// Returns the elapsed milliseconds for a 2xx response and `None` for
    /// anything else, timeouts included.
    pub async fn measure(&self) -> Option<u64> {
        let started = Instant::now();

        let response = self
            .client
            .head(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                debug!("{} answered in {elapsed}ms", self.url);
                Some(elapsed)
            }
            Ok(response) => {
                debug!("{} returned {}", self.url, response.status());
                None
            }
            Err(e) => {
                debug!("{} unreachable: {e}", self.url);
                None
            }
        }
    }

    pub async fn quality(&self) -> (Option<u64>, ConnectionQuality) {
        let latency = self.measure().await;
        (latency, ConnectionQuality::from_latency(latency))
    }
}
