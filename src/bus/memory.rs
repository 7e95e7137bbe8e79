//! In-process message source and sink
//!
//! These behave like a single-partition topic held in memory. They are used to
//! run the worker loop without a broker.

use crate::bus::{MessageSink, MessageSource, RawMessage, SinkError, SourceError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One scripted event of a [`MemorySource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A message to deliver
    Message(Vec<u8>),

    /// The next receive reports an offset fault
    OffsetFault,

    /// Position of the log tail; seeking to the end skips everything before it
    Tail,
}

/// Scripted message source
#[derive(Debug, Default)]
pub struct MemorySource {
    events: VecDeque<SourceEvent>,
    next_offset: i64,
    resets: usize,
    idle_polls: usize,
    shutdown_when_idle: Option<CancellationToken>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that delivers the given payloads in order
    pub fn from_payloads<I, P>(payloads: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vec<u8>>,
    {
        let mut source = Self::new();
        for payload in payloads {
            source.push(payload);
        }
        source
    }

    /// Appends a message payload
    pub fn push(&mut self, payload: impl Into<Vec<u8>>) {
        self.events.push_back(SourceEvent::Message(payload.into()));
    }

    /// Appends an arbitrary event
    pub fn push_event(&mut self, event: SourceEvent) {
        self.events.push_back(event);
    }

    /// Cancels `token` on the second consecutive empty receive
    ///
    /// The first empty receive only ends the current poll cycle, so the cycle
    /// that drained the source still reaches the production check.
    pub fn with_shutdown_when_idle(mut self, token: CancellationToken) -> Self {
        self.shutdown_when_idle = Some(token);
        self
    }

    /// Number of times the position was reset to the tail
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Number of events not yet delivered
    pub fn remaining(&self) -> usize {
        self.events
            .iter()
            .filter(|e| !matches!(e, SourceEvent::Tail))
            .count()
    }
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn recv(&mut self, _deadline: Instant) -> Result<Option<RawMessage>, SourceError> {
        loop {
            match self.events.pop_front() {
                Some(SourceEvent::Message(payload)) => {
                    let offset = self.next_offset;
                    self.next_offset += 1;
                    self.idle_polls = 0;
                    return Ok(Some(RawMessage {
                        payload,
                        partition: 0,
                        offset,
                    }));
                }
                Some(SourceEvent::OffsetFault) => return Err(SourceError::OffsetOutOfRange),
                Some(SourceEvent::Tail) => continue,
                None => {
                    self.idle_polls += 1;
                    if self.idle_polls >= 2 {
                        if let Some(token) = &self.shutdown_when_idle {
                            token.cancel();
                        }
                    }
                    return Ok(None);
                }
            }
        }
    }

    async fn seek_to_end(&mut self) -> Result<(), SourceError> {
        if let Some(tail) = self.events.iter().position(|e| *e == SourceEvent::Tail) {
            let skipped = self
                .events
                .drain(..=tail)
                .filter(|e| matches!(e, SourceEvent::Message(_)))
                .count();
            self.next_offset += skipped as i64;
        }
        self.resets += 1;
        Ok(())
    }
}

/// A message captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub key: Vec<u8>,
    pub partition: i32,
    pub payload: Vec<u8>,
}

/// Sink that records everything published to it
#[derive(Debug)]
pub struct MemorySink {
    partitions: u32,
    published: Mutex<Vec<PublishedMessage>>,
}

impl MemorySink {
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions,
            published: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of everything published so far
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageSink for MemorySink {
    fn partition_count(&self) -> u32 {
        self.partitions
    }

    async fn publish(&self, key: &[u8], partition: i32, payload: &[u8]) -> Result<(), SinkError> {
        let mut published = self
            .published
            .lock()
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        published.push(PublishedMessage {
            key: key.to_vec(),
            partition,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
