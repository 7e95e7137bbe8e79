//! Counters for what the worker loop has done since startup

use tracing::info;

/// Worker statistics
///
/// Every skipped item is counted here in addition to being logged, so a summary
/// at shutdown shows how much input was dropped and why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Incoming messages handled (dispatched or skipped)
    pub messages_consumed: u64,

    /// Incoming messages that failed to decode
    pub decode_errors: u64,

    /// Seed requests passed to the backend
    pub seeds_added: u64,

    /// Crawled pages passed to the backend
    pub pages_crawled: u64,

    /// Links dropped by the exclusion policy
    pub links_filtered: u64,

    /// Request errors passed to the backend
    pub request_errors: u64,

    /// Backend calls that failed and were skipped
    pub backend_errors: u64,

    /// Times the consumer was moved to the tail after an offset fault
    pub offset_resets: u64,

    /// Errors reported by the message source other than offset faults
    pub source_errors: u64,

    /// Production cycles run
    pub batches_produced: u64,

    /// Requests successfully published
    pub requests_pushed: u64,

    /// Requests that failed to encode
    pub encode_errors: u64,

    /// Requests whose URL had no parseable domain
    pub domain_parse_errors: u64,

    /// Requests the sink failed to publish
    pub publish_errors: u64,
}

impl WorkerStats {
    /// Total number of items skipped for any reason
    pub fn total_skipped(&self) -> u64 {
        self.decode_errors
            + self.backend_errors
            + self.encode_errors
            + self.domain_parse_errors
            + self.publish_errors
    }

    /// Logs a summary of the counters
    pub fn log_summary(&self) {
        info!(
            "Consumed {} messages ({} seeds, {} pages, {} request errors, {} links filtered)",
            self.messages_consumed,
            self.seeds_added,
            self.pages_crawled,
            self.request_errors,
            self.links_filtered
        );
        info!(
            "Produced {} batches, pushed {} requests",
            self.batches_produced, self.requests_pushed
        );
        if self.total_skipped() > 0 || self.offset_resets > 0 {
            info!(
                "Skipped: {} decode, {} backend, {} encode, {} domain parse, {} publish; {} offset resets",
                self.decode_errors,
                self.backend_errors,
                self.encode_errors,
                self.domain_parse_errors,
                self.publish_errors,
                self.offset_resets
            );
        }
    }
}
