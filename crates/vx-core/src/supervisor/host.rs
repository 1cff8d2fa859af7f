//! OS collaborators: stale-instance kill and system proxy cleanup.

use std::io;
use std::process::{Command, Stdio};

use tracing::{info, warn};

#[cfg(target_os = "macos")]
const NETWORKSETUP: &str = "/usr/sbin/networksetup";
#[cfg(not(target_os = "macos"))]
const NETWORKSETUP: &str = "networksetup";

const PKILL: &str = "pkill";

/// Header printed by `networksetup -listallnetworkservices`.
const SERVICES_HEADER_MARKER: &str = "An asterisk";
/// Prefix/marker of disabled services in the same listing.
const DISABLED_SERVICE_MARKER: &str = "(*)";

/// Host operations the supervisor depends on but does not own.
pub trait HostControl: Send + Sync {
    /// Kill every process with exactly this name owned by the current user.
    fn kill_existing(&self, process_name: &str) -> io::Result<()>;

    /// Names of all configured network services.
    fn list_network_services(&self) -> io::Result<Vec<String>>;

    fn disable_web_proxy(&self, service: &str) -> io::Result<()>;

    fn disable_secure_web_proxy(&self, service: &str) -> io::Result<()>;
}

/// `pkill` and `networksetup` backed implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    fn networksetup(args: &[&str]) -> io::Result<String> {
        let output = Command::new(NETWORKSETUP)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "networksetup {} exited with {}",
                args.join(" "),
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl HostControl for SystemHost {
    fn kill_existing(&self, process_name: &str) -> io::Result<()> {
        let mut command = Command::new(PKILL);
        command.arg("-x");

        #[cfg(unix)]
        command.args(["-u", &nix::unistd::geteuid().to_string()]);

        // pkill exits 1 when nothing matched; only a failure to run it counts.
        command
            .arg(process_name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|_| ())
    }

    fn list_network_services(&self) -> io::Result<Vec<String>> {
        Self::networksetup(&["-listallnetworkservices"]).map(|out| parse_network_services(&out))
    }

    fn disable_web_proxy(&self, service: &str) -> io::Result<()> {
        Self::networksetup(&["-setwebproxystate", service, "off"]).map(|_| ())
    }

    fn disable_secure_web_proxy(&self, service: &str) -> io::Result<()> {
        Self::networksetup(&["-setsecurewebproxystate", service, "off"]).map(|_| ())
    }
}

/// Service names from a `-listallnetworkservices` listing, without the
/// instructional header and without services marked disabled.
pub fn parse_network_services(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains(SERVICES_HEADER_MARKER)
                && !line.contains(DISABLED_SERVICE_MARKER)
        })
        .map(str::to_owned)
        .collect()
}

/// Turn off web and secure web proxies on every network service.
///
/// Undoes `--system-proxy` when the proxy died without cleaning up.
/// Failures are logged and skipped. Returns the number of services reset.
pub fn reset_system_proxies(host: &dyn HostControl) -> usize {
    let services = match host.list_network_services() {
        Ok(services) => services,
        Err(e) => {
            warn!("Failed to list network services for proxy reset: {e}");
            return 0;
        }
    };

    let mut reset = 0;
    for service in &services {
        let web = host.disable_web_proxy(service);
        if let Err(e) = &web {
            warn!("Failed to disable web proxy on '{service}': {e}");
        }

        let secure = host.disable_secure_web_proxy(service);
        if let Err(e) = &secure {
            warn!("Failed to disable secure web proxy on '{service}': {e}");
        }

        if web.is_ok() && secure.is_ok() {
            reset += 1;
        }
    }

    info!("Reset system proxy on {reset}/{} network services", services.len());
    reset
}
