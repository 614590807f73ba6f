use super::transaction::{Transaction, TransactionDraft, TxId, TxStatus};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Durable CRUD interface over transaction records. No business logic.
///
/// Implementations must serialize conflicting writes to the same record;
/// the engine takes no record locks of its own.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// All records, most-recently-created first.
    async fn list(&self) -> Result<Vec<Transaction>>;
    async fn get(&self, id: TxId) -> Result<Option<Transaction>>;
    /// Inserts drafts as fresh pending records. Returns the count inserted.
    async fn add_batch(&self, drafts: Vec<TransactionDraft>) -> Result<usize>;
    /// Moves a record to `status`, recording the attempted destination and
    /// failure reason. The store derives `sent_at` (now iff `Sent`), keeps
    /// `error_message` only when the status is `Failed`, and refreshes
    /// `updated_at`.
    async fn update_status(
        &self,
        id: TxId,
        status: TxStatus,
        sent_to: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<()>;
    /// Replaces the four payload fields of an existing record.
    async fn update_fields(&self, id: TxId, draft: TransactionDraft) -> Result<()>;
    async fn delete_one(&self, id: TxId) -> Result<()>;
    async fn clear_all(&self) -> Result<()>;
    /// Requeues every record: status back to pending, delivery bookkeeping
    /// cleared, payload fields untouched. Returns the count touched.
    async fn reset_all(&self) -> Result<usize>;
}

pub type TransactionStoreBox = Box<dyn TransactionStore>;

/// Connectivity of a channel, polled by the engine before a run.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    Disconnected,
    Connecting,
    Connected,
}

/// Ordinary delivery result of a send. Transport faults are reported as
/// errors instead and treated by the engine as a failure with the error
/// text as reason.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct SendOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Destination-addressed send capability.
///
/// Two interchangeable variants exist: phone-number-addressed and
/// JID-addressed. Adapters never reformat destinations; normalization is
/// the caller's responsibility.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn status(&self) -> Result<ConnectivityState>;
    /// Delivers one payload. Must return `success: false` for ordinary
    /// delivery rejection and reserve `Err` for unrecoverable transport
    /// faults.
    async fn send(&self, destination: &str, payload: &str) -> Result<SendOutcome>;
}

pub type ChannelBox = Box<dyn Channel>;
