use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned transaction identifier. Never changes across edits.
pub type TxId = u64;

/// Delivery status of a transaction record.
///
/// Legal transitions are `{pending, failed} -> sending -> {sent, failed}`
/// plus the bulk reset `{sent, sending, failed} -> pending`. No transition
/// skips `sending`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Pending,
    Sending,
    Sent,
    Failed,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Sending => "sending",
            TxStatus::Sent => "sent",
            TxStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The four opaque payload fields of a transaction, as supplied at import.
///
/// The engine never validates these for business meaning.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct TransactionDraft {
    pub product_code: String,
    pub destination_code: String,
    pub amount: String,
    pub pin: String,
}

/// One unit of work: four opaque payload fields plus delivery bookkeeping.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: TxId,
    pub product_code: String,
    pub destination_code: String,
    pub amount: String,
    pub pin: String,
    pub status: TxStatus,
    /// Destination the last attempt targeted; `None` until a send is attempted.
    pub sent_to: Option<String>,
    /// Set iff `status == Sent`.
    pub sent_at: Option<DateTime<Utc>>,
    /// Set iff `status == Failed`.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Materializes a draft into a fresh pending record.
    pub fn from_draft(id: TxId, draft: TransactionDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            product_code: draft.product_code,
            destination_code: draft.destination_code,
            amount: draft.amount,
            pin: draft.pin,
            status: TxStatus::Pending,
            sent_to: None,
            sent_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status transition, deriving the bookkeeping fields:
    /// `sent_at` is set iff the new status is `Sent`, `error_message` is
    /// kept only when it is `Failed`, and `updated_at` is refreshed.
    pub fn apply_status(
        &mut self,
        status: TxStatus,
        sent_to: Option<&str>,
        error_message: Option<&str>,
    ) {
        self.status = status;
        self.sent_to = sent_to.map(str::to_string);
        self.sent_at = (status == TxStatus::Sent).then(Utc::now);
        self.error_message = if status == TxStatus::Failed {
            error_message.map(str::to_string)
        } else {
            None
        };
        self.updated_at = Utc::now();
    }

    /// Whether this record is eligible for a dispatch run.
    pub fn is_unsent(&self) -> bool {
        matches!(self.status, TxStatus::Pending | TxStatus::Failed)
    }

    /// Wire payload: the four fields joined literally by `.`, one line.
    ///
    /// No escaping is applied; a field that itself contains `.` makes the
    /// payload ambiguous. Known limitation of the wire format.
    pub fn payload(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.product_code, self.destination_code, self.amount, self.pin
        )
    }
}
