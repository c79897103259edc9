//! NATS-backed topic publisher

use super::{EventPublisher, PublishError};
use async_nats::Client;
use async_trait::async_trait;
use tracing::debug;

/// Publishes envelopes to NATS subjects
#[derive(Clone)]
pub struct NatsPublisher {
    client: Client,
}

impl NatsPublisher {
    /// Connect to a NATS server
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = async_nats::connect(url).await?;
        Ok(Self { client })
    }

    /// Build from an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client, for the consumer side
    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        let bytes = payload.to_string().into_bytes();
        self.client
            .publish(topic.to_string(), bytes.into())
            .await
            .map_err(|e| PublishError {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;

        debug!(topic, key, "published bus message");
        Ok(())
    }
}
