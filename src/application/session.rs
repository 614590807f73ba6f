use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Per-item progress of the active run, emitted after every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// How a run ended. A cancelled run is reported distinctly from a
/// completed one even when the counts are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Final counts of a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub success_count: usize,
    pub failed_count: usize,
    /// Records still `pending` or `failed`, recomputed from the store
    /// after the run ends.
    pub remaining_unsent: usize,
}

/// Ephemeral state of one dispatch run.
///
/// Constructed when a run starts and discarded when it ends; never
/// persisted. At most one session exists per process at a time.
pub(crate) struct DispatchSession {
    cancelled: Arc<AtomicBool>,
    progress_tx: watch::Sender<Progress>,
    pub success_count: usize,
    pub failed_count: usize,
}

impl DispatchSession {
    pub fn new(total: usize) -> (Self, SessionHandle) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (progress_tx, progress_rx) = watch::channel(Progress { current: 0, total });
        let handle = SessionHandle {
            cancelled: cancelled.clone(),
            progress_rx,
        };
        let session = Self {
            cancelled,
            progress_tx,
            success_count: 0,
            failed_count: 0,
        };
        (session, handle)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn emit_progress(&self, current: usize, total: usize) {
        self.progress_tx.send_replace(Progress { current, total });
    }
}

/// External view of the active session: lets callers request cancellation
/// and poll the last known progress while the run loop owns the session.
pub(crate) struct SessionHandle {
    cancelled: Arc<AtomicBool>,
    progress_rx: watch::Receiver<Progress>,
}

impl SessionHandle {
    pub fn request_cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn progress(&self) -> Progress {
        *self.progress_rx.borrow()
    }
}
