//! One function per subcommand.

use crate::report::{LatencyReport, ProbeReport, ResetReport};
use crate::{CliError, CliResult};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use vx_config::Config;
use vx_core::supervisor::reset_system_proxies;
use vx_core::{
    DnsServer, EndpointLatencyMonitor, LatencyProber, LogAggregator, ProxySupervisor,
    SupervisorState, SystemHost,
};

pub(crate) fn print_json<T: Serialize>(value: &T, pretty: bool) -> CliResult<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    println!("{json}");
    Ok(())
}

pub async fn probe(config: &Config, pretty: bool) -> CliResult<()> {
    let prober = LatencyProber::new(&config.probe);
    let best = prober.measure_all().await;
    let report = ProbeReport::new(prober.catalog(), &prober.latencies().await, best.as_ref());

    print_json(&report, pretty)
}

/// Map a `--dns` value to a catalog entry. Anything shaped like
/// `host:port` that is not in the catalog becomes a custom entry.
pub fn resolve_selection(value: &str) -> CliResult<DnsServer> {
    if let Some(server) = DnsServer::find(value) {
        return Ok(server);
    }

    let is_address = value
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());

    if is_address {
        return Ok(DnsServer::new("custom", "Custom", value, "User supplied resolver"));
    }

    Err(CliError::unknown_dns(value))
}

pub async fn run(config: &Config, dns: &str) -> CliResult<()> {
    let selection = resolve_selection(dns)?;

    let prober = LatencyProber::new(&config.probe);
    if selection.is_automatic() {
        info!("Probing DNS servers for automatic selection");
        prober.measure_all().await;
    }
    let dns_address = prober.resolve_address(&selection).await;

    let logs = LogAggregator::new(&config.log_buffer);
    let supervisor = ProxySupervisor::new(config.supervisor.clone(), logs.clone());

    let result = supervise(&supervisor, &logs, &dns_address).await;

    // Dropping the supervisor resets the system proxy
    tokio::task::block_in_place(move || {
        supervisor.stop_blocking();
        drop(supervisor);
    });

    result
}

async fn supervise(
    supervisor: &ProxySupervisor,
    logs: &LogAggregator,
    dns_address: &str,
) -> CliResult<()> {
    let mut flushes = logs.subscribe();
    let mut states: watch::Receiver<SupervisorState> = supervisor.subscribe();
    let mut cursor = 0;

    let port = supervisor.start(Some(dns_address)).await?;
    info!("Proxy running on port {port} with DNS {dns_address}");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = flushes.changed() => {
                if changed.is_err() {
                    break;
                }
                cursor = print_new_entries(logs, cursor);
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                if state == SupervisorState::CrashLoopExceeded {
                    logs.flush();
                    print_new_entries(logs, cursor);
                    supervisor.ensure_not_crash_looping()?;
                }
            }
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {e}");
                }
                info!("Shutting down proxy");
                break;
            }
        }
    }

    Ok(())
}

fn print_new_entries(logs: &LogAggregator, cursor: u64) -> u64 {
    let (entries, next) = logs.entries_since(cursor);
    for entry in entries {
        println!("{entry}");
    }
    next
}

pub async fn latency(config: &Config, watch: bool, pretty: bool) -> CliResult<()> {
    let monitor = EndpointLatencyMonitor::new(&config.monitor);

    if !watch {
        let latency = monitor.measure().await;
        return print_json(&LatencyReport::new(monitor.url(), latency), pretty);
    }

    let mut ticker = tokio::time::interval(config.monitor.interval());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let latency = monitor.measure().await;
                print_json(&LatencyReport::new(monitor.url(), latency), pretty)?;
            }
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

pub fn reset_proxy(pretty: bool) -> CliResult<()> {
    let services_reset = reset_system_proxies(&SystemHost);
    print_json(&ResetReport { services_reset }, pretty)
}

pub fn servers(pretty: bool) -> CliResult<()> {
    let mut servers = vec![DnsServer::automatic()];
    servers.extend(DnsServer::catalog());

    print_json(&servers, pretty)
}
