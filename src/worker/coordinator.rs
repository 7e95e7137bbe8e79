//! Worker loop - consume, dispatch, produce
//!
//! The loop alternates between two phases:
//! - A polling cycle that receives up to `consumer-batch-size` messages within
//!   `poll-timeout-ms`, decodes them and applies them to the backend
//! - A production check that publishes a new request batch when the scheduler
//!   says so
//!
//! It runs until the cancellation token fires or a fatal error occurs.

use crate::backend::Backend;
use crate::bus::{MessageSink, MessageSource, RawMessage, SourceError};
use crate::config::WorkerConfig;
use crate::message::{Codec, JsonCodec};
use crate::worker::dispatcher::{LinkFilter, ResultDispatcher};
use crate::worker::offset::OffsetFaultHandler;
use crate::worker::producer::BatchProducer;
use crate::worker::scheduler::{AdaptiveBatchScheduler, SchedulerState};
use crate::worker::stats::WorkerStats;
use crate::WorkerError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// How a polling cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    /// Batch size or deadline reached, or the source went quiet
    Completed,

    /// The consumer was moved to the tail; the production check is skipped
    OffsetReset,

    /// Shutdown was requested during the cycle
    Cancelled,
}

/// The frontier worker
///
/// Owns the backend and both ends of the bus. Everything runs on one task, so
/// the backend is never accessed concurrently.
pub struct FrontierWorker<B, S, K> {
    backend: B,
    source: S,
    sink: K,
    codec: Box<dyn Codec>,
    dispatcher: ResultDispatcher,
    producer: BatchProducer,
    scheduler: AdaptiveBatchScheduler,
    offset_handler: OffsetFaultHandler,
    consumer_batch_size: usize,
    poll_timeout: Duration,
    stats: WorkerStats,
}

impl<B, S, K> FrontierWorker<B, S, K>
where
    B: Backend,
    S: MessageSource,
    K: MessageSink,
{
    /// Creates a worker
    ///
    /// The outgoing partition count is read from `sink` once, here. Links are
    /// not filtered and payloads use [`JsonCodec`] until configured otherwise.
    ///
    /// # Arguments
    ///
    /// * `config` - The `[worker]` configuration section
    /// * `backend` - Frontier storage and scheduling
    /// * `source` - Incoming topic
    /// * `sink` - Outgoing topic
    pub fn new(config: &WorkerConfig, backend: B, source: S, sink: K) -> Self {
        let producer = BatchProducer::new(sink.partition_count(), config.max_next_requests);
        Self {
            backend,
            source,
            sink,
            codec: Box::new(JsonCodec),
            dispatcher: ResultDispatcher::default(),
            producer,
            scheduler: AdaptiveBatchScheduler::from_config(config, Instant::now()),
            offset_handler: OffsetFaultHandler,
            consumer_batch_size: config.consumer_batch_size,
            poll_timeout: config.poll_timeout(),
            stats: WorkerStats::default(),
        }
    }

    /// Sets the filter applied to links of crawled pages
    pub fn with_link_filter(mut self, filter: impl LinkFilter + 'static) -> Self {
        self.dispatcher = ResultDispatcher::new(Box::new(filter));
        self
    }

    /// Sets the payload codec
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub fn scheduler_state(&self) -> &SchedulerState {
        self.scheduler.state()
    }

    /// Runs the worker loop until `shutdown` is cancelled
    ///
    /// When batching is enabled, one batch is produced before the first poll.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Shutdown was requested and the loop stopped cleanly
    /// * `Err(WorkerError)` - The backend failed fatally or the consumer could
    ///   not be repositioned after an offset fault
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        info!(
            "Starting worker (batch size {}, poll timeout {:?}, new batches {})",
            self.consumer_batch_size,
            self.poll_timeout,
            if self.scheduler.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        );

        let result = self.run_loop(&shutdown).await;

        if let Err(e) = self.sink.flush(FLUSH_TIMEOUT) {
            error!("Failed to flush outgoing messages: {}", e);
        }
        self.stats.log_summary();

        match &result {
            Ok(()) => info!("Worker stopped"),
            Err(e) => error!("Worker stopped on fatal error: {}", e),
        }
        result
    }

    async fn run_loop(&mut self, shutdown: &CancellationToken) -> Result<(), WorkerError> {
        if self.scheduler.is_enabled() {
            self.produce_batch(shutdown).await?;
        } else {
            self.scheduler.restart(Instant::now());
        }

        while !shutdown.is_cancelled() {
            match self.poll_cycle(shutdown).await? {
                CycleOutcome::Completed => {}
                CycleOutcome::OffsetReset => continue,
                CycleOutcome::Cancelled => break,
            }
            info!("Consumed {} items", self.scheduler.state().consumed);

            if self.scheduler.should_produce(Instant::now()) {
                self.produce_batch(shutdown).await?;
            }
        }
        Ok(())
    }

    async fn produce_batch(&mut self, shutdown: &CancellationToken) -> Result<(), WorkerError> {
        let produced = self
            .producer
            .produce(
                &mut self.backend,
                self.codec.as_ref(),
                &self.sink,
                shutdown,
                &mut self.stats,
            )
            .await?;
        self.scheduler.record_batch(produced, Instant::now());
        Ok(())
    }

    async fn poll_cycle(&mut self, shutdown: &CancellationToken) -> Result<CycleOutcome, WorkerError> {
        let deadline = Instant::now() + self.poll_timeout;
        let mut received = 0;

        while received < self.consumer_batch_size {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(CycleOutcome::Cancelled),
                next = self.source.recv(deadline) => next,
            };

            match next {
                Ok(Some(message)) => {
                    received += 1;
                    self.handle_message(message)?;
                }
                Ok(None) => break,
                Err(SourceError::OffsetOutOfRange) => {
                    self.offset_handler
                        .recover(&mut self.source, &mut self.stats)
                        .await?;
                    return Ok(CycleOutcome::OffsetReset);
                }
                Err(e) => {
                    error!("Failed to receive from the incoming topic: {}", e);
                    self.stats.source_errors += 1;
                    // Wait out the cycle instead of spinning on a failing source
                    tokio::select! {
                        _ = shutdown.cancelled() => return Ok(CycleOutcome::Cancelled),
                        _ = tokio::time::sleep_until(deadline) => {}
                    }
                    break;
                }
            }
        }
        Ok(CycleOutcome::Completed)
    }

    fn handle_message(&mut self, message: RawMessage) -> Result<(), WorkerError> {
        match self.codec.decode(&message.payload) {
            Ok(decoded) => {
                self.dispatcher
                    .dispatch(&mut self.backend, decoded, &mut self.stats)?;
            }
            Err(e) => {
                error!(
                    "Decoding error: {} (partition {}, offset {})",
                    e, message.partition, message.offset
                );
                self.stats.decode_errors += 1;
            }
        }
        self.scheduler.record_consumed(1);
        self.stats.messages_consumed += 1;
        Ok(())
    }
}
