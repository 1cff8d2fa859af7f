mod logs;
#[cfg(unix)]
mod supervisor;

use crate::HostControl;

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory host that records every call instead of touching the OS.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub(crate) services: Vec<String>,
    pub(crate) fail_listing: bool,
    pub(crate) failing_service: Option<String>,
    kills: AtomicUsize,
    disabled: Mutex<Vec<(String, &'static str)>>,
}

impl RecordingHost {
    pub(crate) fn with_services(services: &[&str]) -> Self {
        Self {
            services: services.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    pub(crate) fn disabled(&self) -> Vec<(String, &'static str)> {
        self.disabled.lock().unwrap().clone()
    }

    fn record(&self, service: &str, kind: &'static str) -> io::Result<()> {
        if self.failing_service.as_deref() == Some(service) {
            return Err(io::Error::other("networksetup failed"));
        }
        self.disabled.lock().unwrap().push((service.to_string(), kind));
        Ok(())
    }
}

impl HostControl for RecordingHost {
    fn kill_existing(&self, _process_name: &str) -> io::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list_network_services(&self) -> io::Result<Vec<String>> {
        if self.fail_listing {
            return Err(io::Error::other("networksetup missing"));
        }
        Ok(self.services.clone())
    }

    fn disable_web_proxy(&self, service: &str) -> io::Result<()> {
        self.record(service, "web")
    }

    fn disable_secure_web_proxy(&self, service: &str) -> io::Result<()> {
        self.record(service, "secure")
    }
}
