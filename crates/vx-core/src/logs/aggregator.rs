//! Throttled collection of child process output.

use crate::logs::{LineQueue, LogEntry, TIMESTAMP_FORMAT};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Local;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use vx_config::LogBufferConfig;

const READ_CHUNK_SIZE: usize = 4096;

/// Collects lines from the proxy's stdout/stderr and publishes them in
/// batches at most once per flush interval.
///
/// Cloning is cheap; all clones share one buffer and one visible list.
#[derive(Clone)]
pub struct LogAggregator {
    shared: Arc<LogShared>,
}

struct LogShared {
    pending: LineQueue,
    visible: Mutex<Visible>,
    flush_interval: Duration,
    max_entries: usize,
    retain_entries: usize,
    flushes: watch::Sender<u64>,
}

/// The externally visible list and the total number of entries ever added to it.
struct Visible {
    entries: Vec<LogEntry>,
    appended: u64,
}

impl Default for LogAggregator {
    fn default() -> Self {
        Self::new(&LogBufferConfig::default())
    }
}

impl LogAggregator {
    pub fn new(config: &LogBufferConfig) -> Self {
        let (flushes, _) = watch::channel(0);

        Self {
            shared: Arc::new(LogShared {
                pending: LineQueue::new(),
                visible: Mutex::new(Visible {
                    entries: Vec::with_capacity(config.max_entries),
                    appended: 0,
                }),
                flush_interval: config.flush_interval(),
                max_entries: config.max_entries,
                retain_entries: config.retain_entries,
                flushes,
            }),
        }
    }

    /// Stream an output pipe into the aggregator until EOF.
    pub fn attach<R>(&self, mut reader: R, stream: &'static str) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let logs = self.clone();

        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_CHUNK_SIZE];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => logs.push_chunk(&buf[..n]),
                    Err(e) => {
                        debug!("Stopped reading proxy {stream}: {e}");
                        break;
                    }
                }
            }
            trace!("Proxy {stream} closed");
        })
    }

    /// Decode a raw chunk and queue its non-empty lines.
    pub fn push_chunk(&self, chunk: &[u8]) {
        let text = String::from_utf8_lossy(chunk);
        let lines = text
            .split(['\n', '\r'])
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        self.add_lines(lines);
    }

    pub fn add_line(&self, line: impl Into<String>) {
        self.add_lines(vec![line.into()]);
    }

    pub fn add_lines(&self, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }

        if self.shared.pending.append_batch(lines) {
            self.schedule_flush();
        }
    }

    /// Without a runtime to delay on, flush inline.
    fn schedule_flush(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let logs = self.clone();
                let delay = self.shared.flush_interval;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    logs.flush();
                });
            }
            Err(_) => {
                self.flush();
            }
        }
    }

    /// Drain pending lines into the visible list. Returns how many were added.
    pub fn flush(&self) -> usize {
        let lines = self.shared.pending.drain_all();
        if lines.is_empty() {
            return 0;
        }

        let count = lines.len();
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        {
            let mut visible = self.lock_visible();
            visible.appended += count as u64;
            visible.entries.extend(lines.into_iter().map(|text| LogEntry {
                timestamp: timestamp.clone(),
                text,
            }));

            if visible.entries.len() > self.shared.max_entries {
                let excess = visible.entries.len() - self.shared.retain_entries;
                visible.entries.drain(..excess);
            }
        }

        self.shared.flushes.send_modify(|n| *n += 1);
        count
    }

    /// Snapshot of the visible list, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock_visible().entries.clone()
    }

    /// Entries flushed after `cursor` that are still visible, plus the
    /// cursor to pass next time. Start from 0.
    pub fn entries_since(&self, cursor: u64) -> (Vec<LogEntry>, u64) {
        let visible = self.lock_visible();
        let fresh = usize::try_from(visible.appended.saturating_sub(cursor)).unwrap_or(usize::MAX);
        let skip = visible.entries.len().saturating_sub(fresh);

        (visible.entries[skip..].to_vec(), visible.appended)
    }

    pub fn len(&self) -> usize {
        self.lock_visible().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock_visible().entries.clear();
        self.shared.flushes.send_modify(|n| *n += 1);
    }

    /// Number of flushes (and clears) delivered so far; changes on every one.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.flushes.subscribe()
    }

    fn lock_visible(&self) -> MutexGuard<'_, Visible> {
        self.shared
            .visible
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}
