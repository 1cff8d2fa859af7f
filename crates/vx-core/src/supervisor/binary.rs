//! Locating the proxy binary and building its command line.

use crate::{SupervisorError, SupervisorResult};

use std::path::PathBuf;

use tracing::info;
use vx_config::SupervisorConfig;

/// Find the proxy binary.
///
/// Search order:
/// 1. Configured install locations (Homebrew on Apple Silicon, then Intel)
/// 2. Sibling to current exe (bundled copy)
pub fn locate_binary(config: &SupervisorConfig) -> SupervisorResult<PathBuf> {
    let mut candidates: Vec<PathBuf> = config.search_paths.iter().map(PathBuf::from).collect();

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        candidates.push(exe_dir.join(&config.binary_name));
    }

    if let Some(found) = candidates.iter().find(|path| path.is_file()) {
        info!("Using {} at {}", config.binary_name, found.display());
        return Ok(found.clone());
    }

    let searched = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Err(SupervisorError::binary_not_found(searched))
}

/// Argument vector for one launch.
///
/// An empty DNS address is treated as absent.
pub fn build_arguments(
    listen_addr: &str,
    log_level: &str,
    system_proxy: bool,
    dns_address: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "--listen-addr".to_string(),
        listen_addr.to_string(),
        "--log-level".to_string(),
        log_level.to_string(),
    ];

    if system_proxy {
        args.push("--system-proxy".to_string());
    }

    if let Some(dns) = dns_address.filter(|dns| !dns.is_empty()) {
        args.push("--dns-addr".to_string());
        args.push(dns.to_string());
    }

    args
}
