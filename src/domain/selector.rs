use super::transaction::Transaction;

/// Computes the batch for one dispatch run.
///
/// Filters `records` (store order, most-recently-created first) to the
/// unsent ones (`pending` or `failed`) and returns the prefix of length
/// `min(count_requested, unsent)`. An empty result means "nothing to do",
/// not an error. Pure and idempotent for unchanged input.
///
/// Note the inherited ordering: because the store lists newest first, a
/// "send N" request prioritizes newer imports over older unsent ones.
pub fn select_batch(records: &[Transaction], count_requested: usize) -> Vec<Transaction> {
    records
        .iter()
        .filter(|t| t.is_unsent())
        .take(count_requested)
        .cloned()
        .collect()
}
