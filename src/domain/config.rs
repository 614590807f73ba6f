use crate::error::{DispatchError, Result};

/// Minimum inter-send delay. Lower values trip the channel providers'
/// anti-spam detection, so they are rejected before any send occurs.
pub const MIN_SEND_DELAY_MS: u64 = 500;

/// Per-run dispatch configuration supplied by the caller.
///
/// The channel variant is chosen by passing the adapter itself to the
/// engine; the same destination is used for every item in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Target address used for all items in the run. Pre-normalized by the
    /// caller; the engine never reformats it.
    pub destination: String,
    /// Upper bound on items sent this run.
    pub count_requested: usize,
    /// Suspension between consecutive sends.
    pub delay_ms: u64,
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.delay_ms < MIN_SEND_DELAY_MS {
            return Err(DispatchError::Validation(format!(
                "delay_ms must be at least {MIN_SEND_DELAY_MS}, got {}",
                self.delay_ms
            )));
        }
        if self.destination.trim().is_empty() {
            return Err(DispatchError::Validation(
                "destination must not be empty".to_string(),
            ));
        }
        if self.count_requested == 0 {
            return Err(DispatchError::Validation(
                "count_requested must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
