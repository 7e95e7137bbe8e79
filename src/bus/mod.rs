//! Message bus plumbing
//!
//! The worker reads crawl outcomes from a [`MessageSource`] and publishes new
//! requests to a [`MessageSink`]. The Kafka implementations live in
//! [`kafka`]; [`memory`] holds in-process implementations used to drive the
//! worker without a broker.

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
mod partitioner;

pub use partitioner::PartitionKeyer;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// A message as delivered by the source, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

/// Errors reported while consuming
#[derive(Debug, Error)]
pub enum SourceError {
    /// The tracked read position is no longer valid (e.g. retention removed it)
    #[error("Consumer offset out of range")]
    OffsetOutOfRange,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors reported while publishing
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Topic {0} has no partitions")]
    NoPartitions(String),
}

/// Incoming side of the bus
#[async_trait]
pub trait MessageSource: Send {
    /// Waits for the next message until `deadline`
    ///
    /// Returns `Ok(None)` when the deadline passes without a message.
    async fn recv(&mut self, deadline: Instant) -> Result<Option<RawMessage>, SourceError>;

    /// Moves the read position to the newest offset of every assigned partition
    async fn seek_to_end(&mut self) -> Result<(), SourceError>;
}

/// Outgoing side of the bus
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Number of partitions of the outgoing topic
    fn partition_count(&self) -> u32;

    /// Publishes one payload with its key to an explicit partition
    async fn publish(&self, key: &[u8], partition: i32, payload: &[u8]) -> Result<(), SinkError>;

    /// Waits for in-flight messages to be delivered
    fn flush(&self, _timeout: Duration) -> Result<(), SinkError> {
        Ok(())
    }
}
