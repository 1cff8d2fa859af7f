use std::sync::{Mutex, MutexGuard};

/// Lines waiting for the next flush.
///
/// Holds every line appended since the last drain; trimming happens when
/// the batch reaches the visible list.
#[derive(Debug, Default)]
pub struct LineQueue {
    state: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    lines: Vec<String>,
    flush_pending: bool,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of lines.
    ///
    /// Returns `true` when no flush was pending yet; the caller then owns
    /// scheduling it. Every later append until `drain_all` returns `false`.
    pub fn append_batch(&self, lines: Vec<String>) -> bool {
        let mut state = self.lock();
        state.lines.extend(lines);
        !std::mem::replace(&mut state.flush_pending, true)
    }

    /// Take every pending line and clear the pending-flush flag.
    pub fn drain_all(&self) -> Vec<String> {
        let mut state = self.lock();
        state.flush_pending = false;
        std::mem::take(&mut state.lines)
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
