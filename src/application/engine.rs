use crate::application::session::{DispatchSession, Progress, RunOutcome, RunSummary, SessionHandle};
use crate::domain::config::DispatchConfig;
use crate::domain::ports::{Channel, ConnectivityState, TransactionStore, TransactionStoreBox};
use crate::domain::selector::select_batch;
use crate::domain::transaction::{Transaction, TxId, TxStatus};
use crate::error::{DispatchError, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The main entry point of the dispatcher.
///
/// `DispatchEngine` owns the transaction store and orchestrates sequential
/// send runs over a caller-supplied channel. At most one run is active per
/// process; starting a second run fails fast instead of queueing. The
/// engine never creates or deletes transactions, it only reads them and
/// updates their delivery status.
pub struct DispatchEngine {
    store: TransactionStoreBox,
    running: AtomicBool,
    current: Mutex<Option<SessionHandle>>,
}

impl DispatchEngine {
    pub fn new(store: TransactionStoreBox) -> Self {
        Self {
            store,
            running: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// The underlying store, for import/list/delete paths that bypass the
    /// send loop.
    pub fn store(&self) -> &dyn TransactionStore {
        self.store.as_ref()
    }

    /// Executes one dispatch run: select a batch of unsent records, send
    /// them strictly in order over `channel`, persisting every status
    /// transition and throttling between items.
    ///
    /// Validation failures surface before any record is mutated. Per-item
    /// send failures are recorded on the record and do not abort the
    /// remaining batch.
    pub async fn dispatch(&self, channel: &dyn Channel, config: &DispatchConfig) -> Result<RunSummary> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(DispatchError::RunActive);
        }
        let result = self.run(channel, config).await;
        self.set_session(None);
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Requests cooperative cancellation of the active run. The flag is
    /// observed at iteration boundaries; an in-flight send completes
    /// first. Returns whether a run was active.
    pub fn cancel(&self) -> bool {
        let guard = self.current.lock().expect("session lock poisoned");
        match guard.as_ref() {
            Some(handle) => {
                handle.request_cancel();
                true
            }
            None => false,
        }
    }

    /// Last known progress of the active run, if any.
    pub fn progress(&self) -> Option<Progress> {
        let guard = self.current.lock().expect("session lock poisoned");
        guard.as_ref().map(|handle| handle.progress())
    }

    /// Re-delivers a single record to `destination`, bypassing the batch
    /// selector and the run throttle.
    ///
    /// Allowed for any current status, including `sent` (explicit
    /// re-delivery); the record passes through `sending` to a terminal
    /// state either way. No other record is touched.
    pub async fn resend(&self, channel: &dyn Channel, id: TxId, destination: &str) -> Result<Transaction> {
        if destination.trim().is_empty() {
            return Err(DispatchError::Validation(
                "destination must not be empty".to_string(),
            ));
        }
        self.require_connected(channel).await?;

        let tx = self
            .store
            .get(id)
            .await?
            .ok_or(DispatchError::NotFound(id))?;

        self.store
            .update_status(id, TxStatus::Sending, Some(destination), None)
            .await?;

        let (status, reason) = Self::outcome_of(channel.send(destination, &tx.payload()).await);
        info!(id, %status, "resend finished");
        self.store
            .update_status(id, status, Some(destination), reason.as_deref())
            .await?;

        self.store
            .get(id)
            .await?
            .ok_or(DispatchError::NotFound(id))
    }

    /// Requeues every record to `pending`. Returns the count touched.
    pub async fn reset_all(&self) -> Result<usize> {
        self.store.reset_all().await
    }

    async fn run(&self, channel: &dyn Channel, config: &DispatchConfig) -> Result<RunSummary> {
        config.validate()?;
        self.require_connected(channel).await?;

        let records = self.store.list().await?;
        let batch = select_batch(&records, config.count_requested);
        let total = batch.len();

        let (mut session, handle) = DispatchSession::new(total);
        self.set_session(Some(handle));

        info!(
            batch = total,
            destination = %config.destination,
            delay_ms = config.delay_ms,
            "dispatch run started"
        );

        let mut cancelled = false;
        for (i, tx) in batch.iter().enumerate() {
            if session.is_cancelled() {
                cancelled = true;
                break;
            }

            self.attempt(channel, &mut session, tx, &config.destination).await;
            session.emit_progress(i + 1, total);

            if i + 1 < total && !session.is_cancelled() {
                tokio::time::sleep(Duration::from_millis(config.delay_ms)).await;
            }
        }

        let remaining_unsent = self.count_unsent().await?;
        let outcome = if cancelled {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };
        info!(
            ?outcome,
            success = session.success_count,
            failed = session.failed_count,
            remaining_unsent,
            "dispatch run ended"
        );

        Ok(RunSummary {
            outcome,
            success_count: session.success_count,
            failed_count: session.failed_count,
            remaining_unsent,
        })
    }

    /// Steps one record through `sending -> {sent, failed}`.
    ///
    /// Store rejections here are logged and the run carries on; the
    /// record's durable state may then lag the attempted outcome.
    async fn attempt(
        &self,
        channel: &dyn Channel,
        session: &mut DispatchSession,
        tx: &Transaction,
        destination: &str,
    ) {
        // Mark in flight before the send so a crash mid-send leaves the
        // record visibly "sending" rather than silently "pending".
        if let Err(e) = self
            .store
            .update_status(tx.id, TxStatus::Sending, Some(destination), None)
            .await
        {
            warn!(id = tx.id, error = %e, "failed to persist sending status");
        }

        let (status, reason) = Self::outcome_of(channel.send(destination, &tx.payload()).await);
        match status {
            TxStatus::Sent => session.success_count += 1,
            _ => session.failed_count += 1,
        }
        debug!(id = tx.id, %status, "send attempt finished");

        if let Err(e) = self
            .store
            .update_status(tx.id, status, Some(destination), reason.as_deref())
            .await
        {
            warn!(id = tx.id, error = %e, "failed to persist send outcome");
        }
    }

    /// Maps a send result to the terminal status and failure reason. A
    /// transport fault is treated like an ordinary rejection carrying the
    /// fault's message.
    fn outcome_of(
        result: Result<crate::domain::ports::SendOutcome>,
    ) -> (TxStatus, Option<String>) {
        match result {
            Ok(outcome) if outcome.success => (TxStatus::Sent, None),
            Ok(outcome) => (
                TxStatus::Failed,
                Some(outcome.message.unwrap_or_else(|| "send failed".to_string())),
            ),
            Err(e) => (TxStatus::Failed, Some(e.to_string())),
        }
    }

    async fn require_connected(&self, channel: &dyn Channel) -> Result<()> {
        let state = channel.status().await?;
        if state != ConnectivityState::Connected {
            return Err(DispatchError::Validation(format!(
                "channel is not connected (state: {state:?})"
            )));
        }
        Ok(())
    }

    async fn count_unsent(&self) -> Result<usize> {
        let records = self.store.list().await?;
        Ok(records.iter().filter(|t| t.is_unsent()).count())
    }

    fn set_session(&self, handle: Option<SessionHandle>) {
        *self.current.lock().expect("session lock poisoned") = handle;
    }
}
