use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Frontier Worker
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kafka: KafkaConfig,
    pub worker: WorkerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub exclude: Vec<ExcludeEntry>,
}

/// Message bus connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Bootstrap servers of the queue, e.g. "localhost:9092"
    pub location: String,

    /// Consumer group used to track progress on the incoming topic
    #[serde(rename = "frontier-group")]
    pub frontier_group: String,

    /// Topic carrying crawl results into the worker
    #[serde(rename = "incoming-topic")]
    pub incoming_topic: String,

    /// Topic the worker publishes new requests to
    #[serde(rename = "outgoing-topic")]
    pub outgoing_topic: String,

    #[serde(default)]
    pub tls: bool,

    /// Time before the producer stops retrying a message
    #[serde(rename = "message-timeout-ms", default = "default_message_timeout_ms")]
    pub message_timeout_ms: u64,
}

/// Consume/produce loop settings
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of messages handled per poll cycle
    #[serde(rename = "consumer-batch-size", default = "default_consumer_batch_size")]
    pub consumer_batch_size: usize,

    /// Maximum number of requests asked from the backend per batch
    #[serde(rename = "max-next-requests")]
    pub max_next_requests: usize,

    /// How long one poll cycle waits for messages (milliseconds)
    #[serde(rename = "poll-timeout-ms", default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// A new batch is produced at least this often (seconds)
    #[serde(rename = "batch-interval-secs", default = "default_batch_interval_secs")]
    pub batch_interval_secs: u64,

    /// A new batch is produced once consumed > ratio * produced
    #[serde(rename = "new-batch-ratio", default = "default_new_batch_ratio")]
    pub new_batch_ratio: f64,

    /// Only ingest; never produce batches
    #[serde(rename = "disable-new-batches", default)]
    pub disable_new_batches: bool,
}

impl WorkerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_secs)
    }
}

/// Which frontier backend the worker drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

/// Frontier backend settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Path to the SQLite database file (sqlite backend only)
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,
}

/// One link exclusion rule
///
/// Exactly one of `domain` (wildcard pattern matched against the link host) or
/// `substring` (matched anywhere in the link URL) must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeEntry {
    pub domain: Option<String>,
    pub substring: Option<String>,
}

fn default_message_timeout_ms() -> u64 {
    20_000
}

fn default_consumer_batch_size() -> usize {
    128
}

fn default_poll_timeout_ms() -> u64 {
    5_000
}

fn default_batch_interval_secs() -> u64 {
    180
}

fn default_new_batch_ratio() -> f64 {
    0.4
}
