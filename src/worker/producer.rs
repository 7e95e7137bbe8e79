//! Publishing of new request batches

use crate::backend::{Backend, BackendError};
use crate::bus::{MessageSink, PartitionKeyer};
use crate::message::Codec;
use crate::url::parse_domain;
use crate::worker::stats::WorkerStats;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Pulls the next requests from the backend and publishes them
///
/// Each request is keyed by its domain so that all requests for a domain land
/// on the same partition of the outgoing topic.
#[derive(Debug, Clone, Copy)]
pub struct BatchProducer {
    keyer: PartitionKeyer,
    max_next_requests: usize,
}

impl BatchProducer {
    /// # Arguments
    ///
    /// * `partitions` - Partition count of the outgoing topic
    /// * `max_next_requests` - Upper bound of requests asked from the backend per batch
    pub fn new(partitions: u32, max_next_requests: usize) -> Self {
        Self {
            keyer: PartitionKeyer::new(partitions),
            max_next_requests,
        }
    }

    pub fn keyer(&self) -> &PartitionKeyer {
        &self.keyer
    }

    /// Produces one batch
    ///
    /// Requests that fail to encode, have no parseable domain, or fail to
    /// publish are logged and skipped. They still count towards the returned
    /// total, which is the number of requests the backend handed out and the
    /// producer attempted.
    ///
    /// `shutdown` is checked once, before asking the backend. Once fetched, the
    /// batch is published completely even if shutdown is requested meanwhile.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of requests attempted
    /// * `Err(BackendError)` - The backend failed fatally
    pub async fn produce<B, K>(
        &self,
        backend: &mut B,
        codec: &dyn Codec,
        sink: &K,
        shutdown: &CancellationToken,
        stats: &mut WorkerStats,
    ) -> Result<usize, BackendError>
    where
        B: Backend + ?Sized,
        K: MessageSink + ?Sized,
    {
        if shutdown.is_cancelled() {
            return Ok(0);
        }

        let requests = match backend.get_next_requests(self.max_next_requests) {
            Ok(requests) => requests,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Failed to get next requests from the backend: {}", e);
                stats.backend_errors += 1;
                Vec::new()
            }
        };

        // Requests handed out by the backend are no longer queued there, so a
        // fetched batch is always published in full
        let count = requests.len();
        for request in requests {
            let payload = match codec.encode_request(&request) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(
                        "Encoding error: {}, fingerprint: {}, url: {}",
                        e,
                        request.fingerprint(),
                        request.url
                    );
                    stats.encode_errors += 1;
                    continue;
                }
            };

            let domain = match parse_domain(&request.url) {
                Ok(domain) => domain,
                Err(e) => {
                    error!(
                        "URL parsing error: {}, fingerprint: {}, url: {}",
                        e,
                        request.fingerprint(),
                        request.url
                    );
                    stats.domain_parse_errors += 1;
                    continue;
                }
            };

            let key = PartitionKeyer::encode_key(&domain);
            let partition = self.keyer.partition_for(&key);
            if let Err(e) = sink.publish(&key, partition, &payload).await {
                error!("Failed to publish {}: {}", request.url, e);
                stats.publish_errors += 1;
                continue;
            }
            debug!("Pushed {} to partition {}", request.url, partition);
            stats.requests_pushed += 1;
        }

        info!("Pushed new batch of {} items", count);
        stats.batches_produced += 1;
        Ok(count)
    }
}
