//! Event fan-out sink
//!
//! The server-side [`EventSink`] implementation: every committed mutation is
//! broadcast to live WebSocket subscribers and published to the named
//! external topic. Both deliveries are fire-and-forget; topic failures are
//! logged and never surfaced to the write path.

use crate::bus::{AlertEnvelope, EventPublisher, PublishError, TransactionEnvelope};
use crate::ws::StreamHub;
use async_trait::async_trait;
use chrono::Utc;
use fraudwatch_core::{DomainEvent, CHANNEL_TRANSACTIONS};
use fraudwatch_runtime::EventSink;
use std::sync::Arc;
use tracing::warn;

/// Topic names for the two event families
#[derive(Debug, Clone)]
pub struct BusTopics {
    pub transactions: String,
    pub alerts: String,
}

/// Fan-out over the WebSocket hub and the topic publisher
#[derive(Clone)]
pub struct FanoutSink {
    hub: Arc<StreamHub>,
    publisher: Arc<dyn EventPublisher>,
    topics: BusTopics,
    source: String,
}

impl FanoutSink {
    pub fn new(
        hub: Arc<StreamHub>,
        publisher: Arc<dyn EventPublisher>,
        topics: BusTopics,
        source: String,
    ) -> Self {
        Self {
            hub,
            publisher,
            topics,
            source,
        }
    }

    async fn publish_envelope(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let (topic, envelope) = if event.channel() == CHANNEL_TRANSACTIONS {
            let envelope = TransactionEnvelope {
                event_type: event.bus_event_type().to_string(),
                transaction: event.payload(),
                timestamp: Utc::now(),
                source: self.source.clone(),
            };
            (&self.topics.transactions, serde_json::to_value(envelope))
        } else {
            let envelope = AlertEnvelope {
                event_type: event.bus_event_type().to_string(),
                alert: event.payload(),
                timestamp: Utc::now(),
                source: self.source.clone(),
            };
            (&self.topics.alerts, serde_json::to_value(envelope))
        };

        let envelope = envelope.unwrap_or(serde_json::Value::Null);
        self.publisher.publish(topic, event.key(), envelope).await
    }
}

#[async_trait]
impl EventSink for FanoutSink {
    async fn notify(&self, event: DomainEvent) -> fraudwatch_runtime::Result<()> {
        self.hub.broadcast(&event).await;

        if let Err(e) = self.publish_envelope(&event).await {
            // Logged, not retried; the write is already committed
            warn!(error = %e, event_type = event.bus_event_type(), "topic publish failed");
        }

        Ok(())
    }
}
