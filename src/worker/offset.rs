//! Recovery from an invalid consumer position

use crate::bus::{MessageSource, SourceError};
use crate::worker::stats::WorkerStats;
use tracing::{error, warn};

/// Moves the consumer to the tail of the incoming log after an offset fault
///
/// Everything between the invalid position and the tail is never consumed.
/// That loss is accepted so that the worker keeps running instead of stalling
/// on a position that no longer exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetFaultHandler;

impl OffsetFaultHandler {
    /// Seeks every assigned partition to its newest offset
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The source now reads from the tail
    /// * `Err(SourceError)` - The seek itself failed; the worker cannot continue
    pub async fn recover<S: MessageSource + ?Sized>(
        &self,
        source: &mut S,
        stats: &mut WorkerStats,
    ) -> Result<(), SourceError> {
        warn!("Consumer offset is out of range, skipping to the tail of the incoming topic");
        if let Err(e) = source.seek_to_end().await {
            error!("Failed to recover from offset fault: {}", e);
            return Err(e);
        }
        stats.offset_resets += 1;
        Ok(())
    }
}
