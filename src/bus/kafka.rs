//! Kafka implementations of the bus traits (librdkafka via `rdkafka`)

use crate::bus::{MessageSink, MessageSource, RawMessage, SinkError, SourceError};
use crate::config::KafkaConfig;
use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::{ClientConfig, Message, Offset};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const METADATA_TIMEOUT: Duration = Duration::from_secs(15);
const SEEK_TIMEOUT: Duration = Duration::from_secs(10);

fn base_client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.location);

    if config.tls {
        client_config
            .set("security.protocol", "ssl")
            .set("enable.ssl.certificate.verification", "false");
    };

    client_config
}

impl From<KafkaError> for SourceError {
    fn from(e: KafkaError) -> Self {
        match e.rdkafka_error_code() {
            Some(RDKafkaErrorCode::OffsetOutOfRange) | Some(RDKafkaErrorCode::AutoOffsetReset) => {
                SourceError::OffsetOutOfRange
            }
            _ => SourceError::Transport(e.to_string()),
        }
    }
}

impl From<KafkaError> for SinkError {
    fn from(e: KafkaError) -> Self {
        SinkError::Transport(e.to_string())
    }
}

/// Consumer of the incoming topic
///
/// Automatic offset reset is disabled so that an invalid position is reported
/// as [`SourceError::OffsetOutOfRange`] instead of being silently repaired.
pub struct KafkaSource {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaSource {
    pub fn new(config: &KafkaConfig) -> Result<Self, SourceError> {
        let mut client_config = base_client_config(config);
        client_config
            .set("group.id", &config.frontier_group)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "error")
            .set("fetch.message.max.bytes", "1048576")
            .set("fetch.max.bytes", "10485760");

        debug!("rdkafka consumer configuration: {:?}", client_config);
        let consumer: StreamConsumer = client_config.create()?;
        consumer.subscribe(&[config.incoming_topic.as_str()])?;
        info!(
            "Subscribed to {} as group {}",
            config.incoming_topic, config.frontier_group
        );

        Ok(Self {
            consumer,
            topic: config.incoming_topic.clone(),
        })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn recv(&mut self, deadline: Instant) -> Result<Option<RawMessage>, SourceError> {
        match tokio::time::timeout_at(deadline, self.consumer.recv()).await {
            Err(_elapsed) => Ok(None),
            Ok(Ok(message)) => Ok(Some(RawMessage {
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                partition: message.partition(),
                offset: message.offset(),
            })),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn seek_to_end(&mut self) -> Result<(), SourceError> {
        let assignment = self.consumer.assignment()?;
        for element in assignment.elements_for_topic(&self.topic) {
            if let Err(e) = self.consumer.seek(
                element.topic(),
                element.partition(),
                Offset::End,
                SEEK_TIMEOUT,
            ) {
                error!(
                    "Failed to move partition {} of {} to the tail: {}",
                    element.partition(),
                    element.topic(),
                    e
                );
                return Err(SourceError::Transport(e.to_string()));
            }
            warn!(
                "Moved partition {} of {} to the tail of the log",
                element.partition(),
                element.topic()
            );
        }
        Ok(())
    }
}

/// Producer for the outgoing topic
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    partitions: u32,
    queue_timeout: Duration,
}

impl KafkaSink {
    /// Creates the producer and reads the partition count of the outgoing topic
    pub fn new(config: &KafkaConfig) -> Result<Self, SinkError> {
        let mut client_config = base_client_config(config);
        client_config
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("partitioner", "consistent");

        debug!("rdkafka producer configuration: {:?}", client_config);
        let producer: FutureProducer = client_config.create()?;

        // Also serves as a connectivity check against the brokers
        let metadata = producer
            .client()
            .fetch_metadata(Some(config.outgoing_topic.as_str()), METADATA_TIMEOUT)?;
        let partitions = metadata
            .topics()
            .iter()
            .find(|t| t.name() == config.outgoing_topic)
            .map(|t| t.partitions().len() as u32)
            .unwrap_or(0);

        if partitions == 0 {
            return Err(SinkError::NoPartitions(config.outgoing_topic.clone()));
        }
        info!(
            "Publishing to {} ({} partitions)",
            config.outgoing_topic, partitions
        );

        Ok(Self {
            producer,
            topic: config.outgoing_topic.clone(),
            partitions,
            queue_timeout: Duration::from_millis(config.message_timeout_ms),
        })
    }
}

#[async_trait]
impl MessageSink for KafkaSink {
    fn partition_count(&self) -> u32 {
        self.partitions
    }

    async fn publish(&self, key: &[u8], partition: i32, payload: &[u8]) -> Result<(), SinkError> {
        let record = FutureRecord::to(&self.topic)
            .key(key)
            .payload(payload)
            .partition(partition);

        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok(_) => Ok(()),
            Err((e, _)) => Err(e.into()),
        }
    }

    fn flush(&self, timeout: Duration) -> Result<(), SinkError> {
        self.producer.flush(timeout)?;
        Ok(())
    }
}
