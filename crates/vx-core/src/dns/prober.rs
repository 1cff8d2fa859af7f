//! Concurrent TCP connect probes against the resolver catalog.

use crate::dns::{DnsServer, LatencyResult, UNREACHABLE_LATENCY_MS};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use vx_config::ProbeConfig;

/// Measures connect latency to every resolver and remembers the fastest.
///
/// Results are published entry by entry while a round is in flight, so
/// readers may see a partially filled [`LatencyResult`].
pub struct LatencyProber {
    catalog: Vec<DnsServer>,
    port: u16,
    timeout: Duration,
    results: Arc<RwLock<LatencyResult>>,
    best: RwLock<Option<DnsServer>>,
    probing: AtomicBool,
}

impl Default for LatencyProber {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl LatencyProber {
    pub fn new(config: &ProbeConfig) -> Self {
        Self::with_catalog(DnsServer::catalog(), config)
    }

    pub fn with_catalog(catalog: Vec<DnsServer>, config: &ProbeConfig) -> Self {
        Self {
            catalog,
            port: config.port,
            timeout: config.timeout(),
            results: Arc::new(RwLock::new(LatencyResult::default())),
            best: RwLock::new(None),
            probing: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> &[DnsServer] {
        &self.catalog
    }

    /// Run one probing round and return the best server afterwards.
    ///
    /// When nothing answers, the best server of the previous round is kept.
    pub async fn measure_all(&self) -> Option<DnsServer> {
        self.probing.store(true, Ordering::SeqCst);
        self.results.write().await.clear();

        let mut probes = JoinSet::new();
        for server in self.catalog.iter().filter(|server| !server.is_automatic()) {
            let id = server.id.clone();
            let host = server.host().to_string();
            let port = self.port;
            let timeout = self.timeout;

            probes.spawn(async move {
                let latency = probe(&host, port, timeout).await;
                (id, latency)
            });
        }

        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((id, latency)) => {
                    debug!("Probe {id}: {latency}ms");
                    self.results.write().await.insert(id, latency);
                }
                Err(e) => warn!("Probe task failed: {e}"),
            }
        }

        let results = self.results.read().await.clone();
        match select_best(&self.catalog, &results) {
            Some(best) => {
                info!("Fastest DNS server: {} ({:?}ms)", best.name, results.get(&best.id));
                *self.best.write().await = Some(best.clone());
            }
            None => warn!("No DNS server reachable, keeping previous selection"),
        }

        self.probing.store(false, Ordering::SeqCst);
        self.best_server().await
    }

    pub async fn latencies(&self) -> LatencyResult {
        self.results.read().await.clone()
    }

    pub async fn best_server(&self) -> Option<DnsServer> {
        self.best.read().await.clone()
    }

    pub fn is_probing(&self) -> bool {
        self.probing.load(Ordering::SeqCst)
    }

    /// Address to pass as `--dns-addr` for a catalog selection.
    pub async fn resolve_address(&self, selection: &DnsServer) -> String {
        if !selection.is_automatic() {
            return selection.address.clone();
        }

        match self.best_server().await {
            Some(best) => best.address,
            None => DnsServer::default_server().address,
        }
    }
}

/// Time a TCP connect to `host:port`. Any failure or timeout yields
/// [`UNREACHABLE_LATENCY_MS`].
pub async fn probe(host: &str, port: u16, timeout: Duration) -> u64 {
    let started = Instant::now();

    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => {
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            elapsed.min(UNREACHABLE_LATENCY_MS - 1)
        }
        Ok(Err(e)) => {
            debug!("Probe {host}:{port} failed: {e}");
            UNREACHABLE_LATENCY_MS
        }
        Err(_) => {
            debug!("Probe {host}:{port} timed out after {timeout:?}");
            UNREACHABLE_LATENCY_MS
        }
    }
}

/// Fastest reachable server. Ties go to the earlier catalog entry.
pub fn select_best<'a>(catalog: &'a [DnsServer], results: &LatencyResult) -> Option<&'a DnsServer> {
    let mut best: Option<(&DnsServer, u64)> = None;

    for server in catalog {
        let Some(latency) = results.get(&server.id) else {
            continue;
        };

        if latency >= UNREACHABLE_LATENCY_MS {
            continue;
        }

        if best.is_none_or(|(_, best_latency)| latency < best_latency) {
            best = Some((server, latency));
        }
    }

    best.map(|(server, _)| server)
}
