use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{Transaction, TransactionDraft, TxId, TxStatus};
use crate::error::{DispatchError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for transaction records, keyed by big-endian id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for store bookkeeping (the id sequence).
pub const CF_META: &str = "meta";

const NEXT_ID_KEY: &[u8] = b"next_id";

/// A persistent transaction store backed by RocksDB.
///
/// Records are stored as JSON under their big-endian id so iteration
/// yields creation order; `list` reverses that for the newest-first
/// contract. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbTransactionStore {
    db: Arc<DB>,
}

impl RocksDbTransactionStore {
    /// Opens or creates a RocksDB instance at the specified path,
    /// ensuring the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions, cf_meta])?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| DispatchError::Storage(format!("column family {name} not found")))
    }

    fn encode(tx: &Transaction) -> Result<Vec<u8>> {
        serde_json::to_vec(tx)
            .map_err(|e| DispatchError::Storage(format!("serialization error: {e}")))
    }

    fn decode(bytes: &[u8]) -> Result<Transaction> {
        serde_json::from_slice(bytes)
            .map_err(|e| DispatchError::Storage(format!("deserialization error: {e}")))
    }

    fn next_id(&self) -> Result<TxId> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_cf(cf, NEXT_ID_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| DispatchError::Storage("corrupt id sequence".to_string()))?;
                TxId::from_be_bytes(arr)
            }
            None => 0,
        };
        Ok(current)
    }

    fn store_next_id(&self, value: TxId) -> Result<()> {
        let cf = self.cf(CF_META)?;
        self.db.put_cf(cf, NEXT_ID_KEY, value.to_be_bytes())?;
        Ok(())
    }

    fn get_required(&self, id: TxId) -> Result<Transaction> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Self::decode(&bytes),
            None => Err(DispatchError::NotFound(id)),
        }
    }

    fn put(&self, tx: &Transaction) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        self.db.put_cf(cf, tx.id.to_be_bytes(), Self::encode(tx)?)?;
        Ok(())
    }

    fn scan(&self) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| DispatchError::Storage(format!("iteration error: {e}")))?;
            rows.push(Self::decode(&value)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl TransactionStore for RocksDbTransactionStore {
    async fn list(&self) -> Result<Vec<Transaction>> {
        // Keys ascend in creation order; the contract wants newest first.
        let mut rows = self.scan()?;
        rows.reverse();
        Ok(rows)
    }

    async fn get(&self, id: TxId) -> Result<Option<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn add_batch(&self, drafts: Vec<TransactionDraft>) -> Result<usize> {
        let mut id = self.next_id()?;
        let count = drafts.len();
        for draft in drafts {
            id += 1;
            self.put(&Transaction::from_draft(id, draft))?;
        }
        self.store_next_id(id)?;
        Ok(count)
    }

    async fn update_status(
        &self,
        id: TxId,
        status: TxStatus,
        sent_to: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.get_required(id)?;
        tx.apply_status(status, sent_to, error_message);
        self.put(&tx)
    }

    async fn update_fields(&self, id: TxId, draft: TransactionDraft) -> Result<()> {
        let mut tx = self.get_required(id)?;
        tx.product_code = draft.product_code;
        tx.destination_code = draft.destination_code;
        tx.amount = draft.amount;
        tx.pin = draft.pin;
        tx.updated_at = Utc::now();
        self.put(&tx)
    }

    async fn delete_one(&self, id: TxId) -> Result<()> {
        // Existence check first so unknown ids surface as NotFound.
        self.get_required(id)?;
        let cf = self.cf(CF_TRANSACTIONS)?;
        self.db.delete_cf(cf, id.to_be_bytes())?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        for tx in self.scan()? {
            self.db.delete_cf(cf, tx.id.to_be_bytes())?;
        }
        Ok(())
    }

    async fn reset_all(&self) -> Result<usize> {
        let mut touched = 0;
        for mut tx in self.scan()? {
            tx.apply_status(TxStatus::Pending, None, None);
            self.put(&tx)?;
            touched += 1;
        }
        Ok(touched)
    }
}
