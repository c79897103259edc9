//! Message-bus boundary
//!
//! Envelope types for the transactions/alerts topics, the publisher trait
//! used by the fan-out sink, and the consumer feeding the pipeline from the
//! transactions topic. Publication is best-effort: failures are logged and
//! never retried synchronously, and never affect the committed write.

mod consumer;
#[cfg(feature = "nats")]
mod nats;

pub use consumer::IngestConsumer;
#[cfg(feature = "nats")]
pub use nats::NatsPublisher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Publish failure
#[derive(Error, Debug)]
#[error("publish to {topic} failed: {message}")]
pub struct PublishError {
    pub topic: String,
    pub message: String,
}

/// Envelope on the transactions topic
///
/// Generic over the payload: outbound messages carry the full persisted
/// transaction, inbound messages carry the draft fields of an external
/// submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope<T> {
    pub event_type: String,
    pub transaction: T,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Envelope on the alerts topic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEnvelope<T> {
    pub event_type: String,
    pub alert: T,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// Publishes envelopes to named external topics
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one message; the key is the external transaction id
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError>;
}

/// Publisher used when no broker is configured; logs and drops
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        _payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        debug!(topic, key, "no bus configured, dropping message");
        Ok(())
    }
}

/// A message recorded by [`MockPublisher`]
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub payload: serde_json::Value,
}

/// Recording publisher for tests
#[derive(Clone, Default)]
pub struct MockPublisher {
    published: Arc<Mutex<Vec<PublishedMessage>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published messages, in order
    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Number of published messages
    pub fn message_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl EventPublisher for MockPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
        });
        Ok(())
    }
}
