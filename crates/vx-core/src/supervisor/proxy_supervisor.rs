//! Proxy process lifecycle with crash recovery.

use crate::logs::LogAggregator;
use crate::supervisor::{
    CrashDecision, CrashRecord, HostControl, RunningChild, SupervisorCommand, SupervisorState,
    SystemHost, build_arguments, locate_binary, reset_system_proxies,
};
use crate::{PortAllocator, SupervisorError, SupervisorResult};

#[cfg(unix)]
use crate::supervisor::running_child::send_signal;

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use vx_config::SupervisorConfig;

/// Supervises the local DPI-bypass proxy.
///
/// Responsibilities:
/// - Kill stale instances, pick a port and launch the binary
/// - Stream its stdout/stderr into the [`LogAggregator`]
/// - Restart it after unexpected exits, up to the crash limit
/// - Stop it on request and undo its system proxy on teardown
///
/// Dropping the supervisor terminates the child it still owns and resets
/// the system proxy settings.
pub struct ProxySupervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    config: SupervisorConfig,
    host: Arc<dyn HostControl>,
    logs: LogAggregator,
    ports: PortAllocator,
    /// Serialises start, stop and scheduled restarts
    control: Mutex<()>,
    child: StdMutex<Option<RunningChild>>,
    generation: AtomicU64,
    user_stop: AtomicBool,
    torn_down: AtomicBool,
    crash: StdMutex<CrashRecord>,
    dns_address: StdMutex<Option<String>>,
    state_tx: watch::Sender<SupervisorState>,
    command_tx: mpsc::UnboundedSender<SupervisorCommand>,
    command_rx: StdMutex<Option<mpsc::UnboundedReceiver<SupervisorCommand>>>,
}

impl ProxySupervisor {
    pub fn new(config: SupervisorConfig, logs: LogAggregator) -> Self {
        Self::with_host(config, logs, Arc::new(SystemHost))
    }

    /// Create a supervisor whose OS collaborators are replaced by `host`.
    pub fn with_host(
        config: SupervisorConfig,
        logs: LogAggregator,
        host: Arc<dyn HostControl>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SupervisorState::Stopped);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let ports = PortAllocator::from_config(&config);

        Self {
            inner: Arc::new(SupervisorInner {
                config,
                host,
                logs,
                ports,
                control: Mutex::new(()),
                child: StdMutex::new(None),
                generation: AtomicU64::new(0),
                user_stop: AtomicBool::new(false),
                torn_down: AtomicBool::new(false),
                crash: StdMutex::new(CrashRecord::default()),
                dns_address: StdMutex::new(None),
                state_tx,
                command_tx,
                command_rx: StdMutex::new(Some(command_rx)),
            }),
        }
    }

    /// Start the proxy, optionally pinned to a DNS resolver.
    ///
    /// A child that is already running is retired first. Returns the port
    /// the proxy was told to listen on.
    pub async fn start(&self, dns_address: Option<&str>) -> SupervisorResult<u16> {
        let inner = &self.inner;
        let _control = inner.control.lock().await;

        inner.user_stop.store(false, Ordering::SeqCst);
        *lock(&inner.dns_address) = dns_address
            .filter(|dns| !dns.is_empty())
            .map(str::to_owned);

        if self.state() == SupervisorState::CrashLoopExceeded {
            info!("Clearing crash record for explicit start");
            lock(&inner.crash).reset();
        }

        self.start_command_handler();
        inner.launch_locked().await
    }

    /// Stop the proxy without waiting for it to exit.
    ///
    /// Suppresses auto-restart. A no-op apart from the state when nothing runs.
    pub async fn stop(&self) {
        let inner = &self.inner;
        let _control = inner.control.lock().await;

        inner.user_stop.store(true, Ordering::SeqCst);

        let taken = lock(&inner.child).take();
        if let Some(mut child) = taken {
            inner.set_state(SupervisorState::Stopping);
            child.request_stop();
            inner.logs.add_line("Proxy stopped");
            info!("Stop requested for proxy (generation {})", child.generation);
        }

        inner.set_state(SupervisorState::Stopped);
    }

    /// Stop the proxy and wait up to the stop timeout for it to exit,
    /// force killing it afterwards.
    ///
    /// For shutdown paths that cannot await. Blocks the calling thread, so
    /// on a current-thread runtime the exit can only be observed once the
    /// timeout has passed. Does not wait for the control lock; a launch
    /// already in flight notices the stop before installing its child.
    pub fn stop_blocking(&self) {
        let inner = &self.inner;
        inner.user_stop.store(true, Ordering::SeqCst);

        let taken = lock(&inner.child).take();
        if let Some(mut child) = taken {
            inner.set_state(SupervisorState::Stopping);
            child.request_stop();

            let timeout = inner.config.stop_timeout();
            if child.wait_for_exit(timeout) {
                info!("Proxy exited within {timeout:?}");
            } else {
                warn!("Proxy did not exit within {timeout:?}");
                child.force_kill();
            }
        }

        inner.set_state(SupervisorState::Stopped);
    }

    /// Fails with `CrashLoopExceeded` while the supervisor has given up.
    pub fn ensure_not_crash_looping(&self) -> SupervisorResult<()> {
        if self.state() == SupervisorState::CrashLoopExceeded {
            return Err(SupervisorError::crash_loop_exceeded(
                lock(&self.inner.crash).count(),
            ));
        }
        Ok(())
    }

    pub fn state(&self) -> SupervisorState {
        *self.inner.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn port(&self) -> Option<u16> {
        lock(&self.inner.child).as_ref().map(|child| child.port)
    }

    pub fn pid(&self) -> Option<u32> {
        lock(&self.inner.child).as_ref().and_then(|child| child.pid)
    }

    /// DNS address used by the last start and by automatic restarts.
    pub fn dns_address(&self) -> Option<String> {
        lock(&self.inner.dns_address).clone()
    }

    pub fn crash_count(&self) -> u32 {
        lock(&self.inner.crash).count()
    }

    pub fn logs(&self) -> &LogAggregator {
        &self.inner.logs
    }

    pub fn add_log(&self, message: impl Into<String>) {
        self.inner.logs.add_line(message);
    }

    pub fn clear_logs(&self) {
        self.inner.logs.clear();
    }

    /// Disable web proxies on every network service. Returns how many were reset.
    pub fn reset_system_proxies(&self) -> usize {
        reset_system_proxies(self.inner.host.as_ref())
    }

    /// Spawn the restart handler on first use.
    fn start_command_handler(&self) {
        let Some(mut command_rx) = lock(&self.inner.command_rx).take() else {
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.restart_delay();

        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                match command {
                    SupervisorCommand::Restart {
                        generation,
                        attempt,
                    } => {
                        tokio::time::sleep(delay).await;

                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        inner.restart(generation, attempt).await;
                    }
                }
            }
            debug!("Supervisor command handler stopped");
        });
    }
}

impl SupervisorInner {
    /// Relaunch after a crash, unless a stop or a newer launch got there first.
    async fn restart(self: &Arc<Self>, generation: u64, attempt: u32) {
        let _control = self.control.lock().await;

        if self.user_stop.load(Ordering::SeqCst) || self.torn_down.load(Ordering::SeqCst) {
            debug!("Skipping restart {attempt}: proxy was stopped");
            return;
        }

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Skipping restart {attempt}: generation {generation} was superseded");
            return;
        }

        info!("Restarting proxy (attempt {attempt}/{})", self.config.max_crashes);

        if let Err(e) = self.launch_locked().await {
            error!("Automatic restart failed: {e}");
        }
    }

    /// Launch a new child. Caller holds the control lock.
    async fn launch_locked(self: &Arc<Self>) -> SupervisorResult<u16> {
        match self.try_launch().await {
            Ok(port) => Ok(port),
            Err(e) => {
                self.set_state(SupervisorState::Stopped);
                self.logs.add_line(format!("Failed to start proxy: {e}"));
                Err(e)
            }
        }
    }

    async fn try_launch(self: &Arc<Self>) -> SupervisorResult<u16> {
        self.retire_current().await;
        self.set_state(SupervisorState::Starting);

        let binary = locate_binary(&self.config)?;

        let host = Arc::clone(&self.host);
        let name = self.config.binary_name.clone();
        match tokio::task::spawn_blocking(move || host.kill_existing(&name)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to kill existing {}: {e}", self.config.binary_name),
            Err(e) => warn!("Stale instance cleanup task failed: {e}"),
        }

        tokio::time::sleep(self.config.settle_delay()).await;

        let port = self.ports.find_available()?;
        let listen_addr = format!("{}:{port}", self.config.listen_host);
        let dns = lock(&self.dns_address).clone();
        let args = build_arguments(
            &listen_addr,
            &self.config.child_log_level,
            self.config.system_proxy,
            dns.as_deref(),
        );

        self.logs
            .add_line(format!("Starting {} {}", binary.display(), args.join(" ")));

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::start_failed(format!("{}: {e}", binary.display())))?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let pid = child.id();

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(self.logs.attach(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(self.logs.attach(stderr, "stderr"));
        }

        let (terminate_tx, terminate_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = std::sync::mpsc::sync_channel(1);
        let mut running = RunningChild::new(generation, pid, port, terminate_tx, exit_rx, readers);

        {
            // stop_blocking and Drop skip the control lock, so a stop can
            // land while this launch is in flight.
            let mut slot = lock(&self.child);
            let stopped = self.user_stop.load(Ordering::SeqCst);
            if stopped || self.torn_down.load(Ordering::SeqCst) {
                drop(slot);
                running.request_stop();
                running.signal_terminate();
                self.spawn_watcher(child, generation, terminate_rx, exit_tx);
                let reason = if stopped {
                    "proxy was stopped during launch"
                } else {
                    "supervisor is shutting down"
                };
                return Err(SupervisorError::start_failed(reason));
            }
            *slot = Some(running);
        }

        self.set_state(SupervisorState::Running { port });
        self.spawn_watcher(child, generation, terminate_rx, exit_tx);
        self.schedule_stability_reset(generation);

        info!("Started {} on port {port} (PID: {pid:?})", self.config.binary_name);
        Ok(port)
    }

    /// Terminate an owned child without going through the crash path.
    async fn retire_current(&self) {
        let taken = lock(&self.child).take();
        let Some(mut previous) = taken else {
            return;
        };

        info!("Retiring proxy (generation {})", previous.generation);
        previous.request_stop();

        let timeout = self.config.stop_timeout();
        let waited = tokio::task::spawn_blocking(move || {
            if !previous.wait_for_exit(timeout) {
                previous.force_kill();
            }
        })
        .await;

        if let Err(e) = waited {
            warn!("Waiting for retired proxy failed: {e}");
        }
    }

    fn spawn_watcher(
        self: &Arc<Self>,
        mut child: Child,
        generation: u64,
        terminate_rx: oneshot::Receiver<()>,
        exit_tx: SyncSender<()>,
    ) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let grace = self.config.stop_timeout();

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = terminate_rx => terminate(&mut child, grace).await,
            };

            let _ = exit_tx.try_send(());

            if let Some(inner) = weak.upgrade() {
                inner.handle_exit(generation, status);
            }
        });
    }

    /// Crash policy, applied to every exit of a launched child.
    fn handle_exit(&self, generation: u64, status: io::Result<ExitStatus>) {
        let code = match &status {
            Ok(status) => status.code(),
            Err(e) => {
                warn!("Failed to wait for proxy: {e}");
                None
            }
        };

        match code {
            Some(code) => self
                .logs
                .add_line(format!("Process terminated (exit code: {code})")),
            None => self.logs.add_line("Process terminated by signal"),
        }
        info!("Proxy generation {generation} exited with {code:?}");

        {
            let mut slot = lock(&self.child);
            if slot.as_ref().map(|child| child.generation) != Some(generation) {
                debug!("Ignoring exit of superseded generation {generation}");
                return;
            }
            *slot = None;
        }

        let expected = self.user_stop.load(Ordering::SeqCst)
            || self.torn_down.load(Ordering::SeqCst)
            || code == Some(0);

        if expected {
            self.set_state(SupervisorState::Stopped);
            return;
        }

        let max_crashes = self.config.max_crashes;
        let decision =
            lock(&self.crash).register_crash(Instant::now(), self.config.crash_window(), max_crashes);

        match decision {
            CrashDecision::Restart { attempt } => {
                self.set_state(SupervisorState::Stopped);
                self.logs.add_line(format!(
                    "Proxy crashed, restarting in {}ms ({attempt}/{max_crashes})",
                    self.config.restart_delay_ms
                ));
                warn!("Proxy crashed, scheduling restart {attempt}/{max_crashes}");

                if self
                    .command_tx
                    .send(SupervisorCommand::Restart {
                        generation,
                        attempt,
                    })
                    .is_err()
                {
                    error!("Restart handler is gone, proxy stays stopped");
                }
            }
            CrashDecision::GiveUp { crashes } => {
                self.set_state(SupervisorState::CrashLoopExceeded);
                self.logs
                    .add_line(format!("Proxy crashed {crashes} times, giving up"));
                error!("Proxy crash loop: {crashes} crashes within {:?}", self.config.crash_window());
            }
        }
    }

    /// Clear the crash record once a launch has stayed up long enough.
    fn schedule_stability_reset(self: &Arc<Self>, generation: u64) {
        let weak = Arc::downgrade(self);
        let stable_run = self.config.stable_run();

        tokio::spawn(async move {
            tokio::time::sleep(stable_run).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };

            let still_running =
                lock(&inner.child).as_ref().map(|child| child.generation) == Some(generation);
            if still_running {
                let mut crash = lock(&inner.crash);
                if crash.count() > 0 {
                    debug!("Proxy stable for {stable_run:?}, clearing {} crashes", crash.count());
                }
                crash.reset();
            }
        });
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!("Supervisor state: {} -> {}", previous.label(), state.label());
        }
    }
}

impl Drop for ProxySupervisor {
    fn drop(&mut self) {
        let inner = &self.inner;
        inner.torn_down.store(true, Ordering::SeqCst);
        inner.user_stop.store(true, Ordering::SeqCst);

        let taken = lock(&inner.child).take();
        if let Some(mut child) = taken {
            child.request_stop();
            child.signal_terminate();
            info!("Terminated proxy (generation {}) on teardown", child.generation);
        }

        inner.set_state(SupervisorState::Stopped);
        reset_system_proxies(inner.host.as_ref());
    }
}

/// SIGTERM, then a hard kill if the child outlives `grace`.
async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        let Some(pid) = child.id() else {
            return child.wait().await;
        };
        send_signal(pid, nix::sys::signal::Signal::SIGTERM);
    }

    #[cfg(not(unix))]
    {
        child.start_kill()?;
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!("Proxy ignored termination for {grace:?}, killing");
            child.start_kill()?;
            child.wait().await
        }
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
