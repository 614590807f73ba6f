use crate::domain::transaction::Transaction;
use crate::error::Result;
use std::io::Write;

/// Writes the transaction table as CSV, one row per record.
///
/// Optional fields serialize as empty cells; timestamps as RFC 3339.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { writer: csv::Writer::from_writer(sink) }
    }

    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        self.writer.write_record([
            "id",
            "product_code",
            "destination_code",
            "amount",
            "pin",
            "status",
            "sent_to",
            "sent_at",
            "error_message",
        ])?;
        for tx in transactions {
            self.writer.write_record([
                tx.id.to_string().as_str(),
                tx.product_code.as_str(),
                tx.destination_code.as_str(),
                tx.amount.as_str(),
                tx.pin.as_str(),
                tx.status.to_string().as_str(),
                tx.sent_to.as_deref().unwrap_or(""),
                tx.sent_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default()
                    .as_str(),
                tx.error_message.as_deref().unwrap_or(""),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
