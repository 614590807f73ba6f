use crate::domain::transaction::TransactionDraft;
use crate::error::{DispatchError, Result};
use std::io::Read;

/// Reads transaction drafts from a CSV source.
///
/// Expected header: `product_code,destination_code,amount,pin`. The
/// reader wraps `csv::Reader` and yields `Result<TransactionDraft>` so a
/// malformed line surfaces as a per-line error without aborting the
/// stream. Whitespace is trimmed and record lengths are flexible.
pub struct DraftReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> DraftReader<R> {
    /// Creates a new `DraftReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes drafts,
    /// allowing large imports to stream without loading the whole file.
    pub fn drafts(self) -> impl Iterator<Item = Result<TransactionDraft>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DispatchError::from))
    }
}
