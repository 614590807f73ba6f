use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{Transaction, TransactionDraft, TxId, TxStatus};
use crate::error::{DispatchError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: TxId,
    rows: Vec<Transaction>,
}

/// A thread-safe in-memory store for transaction records.
///
/// Uses `Arc<RwLock<..>>` for shared concurrent access; writes to the same
/// record are serialized by the lock. Ideal for testing and for
/// single-invocation workflows where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn list(&self) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        // Insertion order is creation order; reverse for newest-first.
        Ok(inner.rows.iter().rev().cloned().collect())
    }

    async fn get(&self, id: TxId) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|t| t.id == id).cloned())
    }

    async fn add_batch(&self, drafts: Vec<TransactionDraft>) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let count = drafts.len();
        for draft in drafts {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.rows.push(Transaction::from_draft(id, draft));
        }
        Ok(count)
    }

    async fn update_status(
        &self,
        id: TxId,
        status: TxStatus,
        sent_to: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let tx = inner
            .rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DispatchError::NotFound(id))?;
        tx.apply_status(status, sent_to, error_message);
        Ok(())
    }

    async fn update_fields(&self, id: TxId, draft: TransactionDraft) -> Result<()> {
        let mut inner = self.inner.write().await;
        let tx = inner
            .rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DispatchError::NotFound(id))?;
        tx.product_code = draft.product_code;
        tx.destination_code = draft.destination_code;
        tx.amount = draft.amount;
        tx.pin = draft.pin;
        tx.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_one(&self, id: TxId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|t| t.id != id);
        if inner.rows.len() == before {
            return Err(DispatchError::NotFound(id));
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.rows.clear();
        Ok(())
    }

    async fn reset_all(&self) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;
        for tx in inner.rows.iter_mut() {
            tx.apply_status(TxStatus::Pending, None, None);
            touched += 1;
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(n: usize) -> TransactionDraft {
        TransactionDraft {
            product_code: format!("P{n}"),
            destination_code: "0812".into(),
            amount: "1000".into(),
            pin: "1234".into(),
        }
    }

    #[tokio::test]
    async fn test_add_batch_assigns_sequential_ids_and_lists_newest_first() {
        let store = InMemoryTransactionStore::new();
        let inserted = store.add_batch(vec![draft(1), draft(2), draft(3)]).await.unwrap();
        assert_eq!(inserted, 3);

        let rows = store.list().await.unwrap();
        let ids: Vec<u64> = rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_update_status_maintains_invariants() {
        let store = InMemoryTransactionStore::new();
        store.add_batch(vec![draft(1)]).await.unwrap();

        store
            .update_status(1, TxStatus::Sending, Some("628"), None)
            .await
            .unwrap();
        let tx = store.get(1).await.unwrap().unwrap();
        assert_eq!(tx.status, TxStatus::Sending);
        assert!(tx.sent_at.is_none());
        assert!(tx.error_message.is_none());

        store
            .update_status(1, TxStatus::Failed, Some("628"), Some("timeout"))
            .await
            .unwrap();
        let tx = store.get(1).await.unwrap().unwrap();
        assert_eq!(tx.error_message.as_deref(), Some("timeout"));
        assert!(tx.sent_at.is_none());

        // Moving away from failed clears the error message.
        store
            .update_status(1, TxStatus::Sent, Some("628"), None)
            .await
            .unwrap();
        let tx = store.get(1).await.unwrap().unwrap();
        assert!(tx.sent_at.is_some());
        assert!(tx.error_message.is_none());
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let store = InMemoryTransactionStore::new();
        let err = store
            .update_status(42, TxStatus::Sending, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_update_fields_keeps_id_and_status() {
        let store = InMemoryTransactionStore::new();
        store.add_batch(vec![draft(1)]).await.unwrap();
        store
            .update_status(1, TxStatus::Sending, Some("628"), None)
            .await
            .unwrap();

        store.update_fields(1, draft(9)).await.unwrap();
        let tx = store.get(1).await.unwrap().unwrap();
        assert_eq!(tx.id, 1);
        assert_eq!(tx.product_code, "P9");
        assert_eq!(tx.status, TxStatus::Sending);
    }

    #[tokio::test]
    async fn test_reset_all_requeues_everything() {
        let store = InMemoryTransactionStore::new();
        store.add_batch(vec![draft(1), draft(2)]).await.unwrap();
        store
            .update_status(1, TxStatus::Sent, Some("628"), None)
            .await
            .unwrap();
        store
            .update_status(2, TxStatus::Failed, Some("628"), Some("boom"))
            .await
            .unwrap();

        assert_eq!(store.reset_all().await.unwrap(), 2);
        for tx in store.list().await.unwrap() {
            assert_eq!(tx.status, TxStatus::Pending);
            assert!(tx.sent_to.is_none());
            assert!(tx.sent_at.is_none());
            assert!(tx.error_message.is_none());
            assert!(!tx.product_code.is_empty());
        }
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = InMemoryTransactionStore::new();
        store.add_batch(vec![draft(1), draft(2)]).await.unwrap();

        store.delete_one(1).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(store.delete_one(1).await.is_err());

        store.clear_all().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
