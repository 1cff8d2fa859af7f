use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The supervisor's handle on one launched proxy process.
///
/// The `Child` itself lives in the exit watcher task; this side keeps the
/// ways to ask it to stop and to learn that it has exited.
pub(crate) struct RunningChild {
    pub(crate) generation: u64,
    pub(crate) pid: Option<u32>,
    pub(crate) port: u16,
    terminate_tx: Option<oneshot::Sender<()>>,
    exit_rx: Receiver<()>,
    readers: Vec<JoinHandle<()>>,
}

impl RunningChild {
    pub(crate) fn new(
        generation: u64,
        pid: Option<u32>,
        port: u16,
        terminate_tx: oneshot::Sender<()>,
        exit_rx: Receiver<()>,
        readers: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            generation,
            pid,
            port,
            terminate_tx: Some(terminate_tx),
            exit_rx,
            readers,
        }
    }

    /// Ask the watcher to terminate the process and stop reading its output.
    pub(crate) fn request_stop(&mut self) {
        if let Some(tx) = self.terminate_tx.take() {
            let _ = tx.send(());
        }

        for reader in self.readers.drain(..) {
            reader.abort();
        }
    }

    /// Block until the watcher reports the exit, up to `timeout`.
    ///
    /// A watcher that is gone counts as exited.
    pub(crate) fn wait_for_exit(&self, timeout: Duration) -> bool {
        match self.exit_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Send SIGTERM straight to the pid, bypassing the watcher.
    pub(crate) fn signal_terminate(&self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.pid {
                send_signal(pid, nix::sys::signal::Signal::SIGTERM);
            }
        }
    }

    pub(crate) fn force_kill(&self) {
        let Some(pid) = self.pid else {
            return;
        };

        info!("Force killing proxy process (PID: {pid})");

        #[cfg(unix)]
        {
            send_signal(pid, nix::sys::signal::Signal::SIGKILL);
        }

        #[cfg(windows)]
        {
            std::process::Command::new("taskkill")
                .args(["/F", "/PID", &pid.to_string()])
                .output()
                .ok();
        }
    }
}

#[cfg(unix)]
pub(crate) fn send_signal(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };

    if let Err(e) = kill(Pid::from_raw(raw), signal) {
        // ESRCH just means it is already gone.
        if e != nix::errno::Errno::ESRCH {
            warn!("Failed to send {signal} to pid {pid}: {e}");
        }
    }
}
