//! Transactions-topic consumer
//!
//! Feeds externally submitted transactions into the pipeline with the
//! tolerant duplicate policy: delivery may be at-least-once, so a redelivery
//! of an already-persisted id is a logged no-op, never an error. Message
//! handling failures are logged and the consumer keeps draining.

use super::TransactionEnvelope;
use fraudwatch_core::TransactionDraft;
use fraudwatch_runtime::{DuplicatePolicy, IngestOutcome, IngestPipeline, RuntimeError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Actor recorded on records created from the bus
const CONSUMER_ACTOR: &str = "bus-consumer";

/// Consumer error
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] RuntimeError),
}

/// Consumes transaction envelopes and runs them through the pipeline
#[derive(Clone)]
pub struct IngestConsumer {
    pipeline: Arc<IngestPipeline>,
}

impl IngestConsumer {
    pub fn new(pipeline: Arc<IngestPipeline>) -> Self {
        Self { pipeline }
    }

    /// Handle one raw message payload
    ///
    /// Returns the ingest outcome for `transaction.created` envelopes and
    /// `None` for event types this consumer ignores.
    pub async fn process_message(
        &self,
        payload: &[u8],
    ) -> Result<Option<IngestOutcome>, ConsumerError> {
        let envelope: TransactionEnvelope<TransactionDraft> = serde_json::from_slice(payload)?;

        if envelope.event_type != "transaction.created" {
            debug!(event_type = %envelope.event_type, "ignoring envelope");
            return Ok(None);
        }

        let outcome = self
            .pipeline
            .ingest(envelope.transaction, DuplicatePolicy::Skip, CONSUMER_ACTOR)
            .await?;

        match &outcome {
            IngestOutcome::Created { transaction, alert } => {
                info!(
                    transaction_id = %transaction.transaction_id,
                    alerted = alert.is_some(),
                    "consumed transaction"
                );
            }
            IngestOutcome::Skipped { transaction_id } => {
                debug!(%transaction_id, "redelivery skipped");
            }
        }

        Ok(Some(outcome))
    }

    /// Drain a NATS subscription until it closes
    #[cfg(feature = "nats")]
    pub async fn run(&self, client: async_nats::Client, subject: String) -> anyhow::Result<()> {
        use futures::StreamExt;

        let mut subscription = client.subscribe(subject.clone()).await?;
        info!(subject = %subject, "bus consumer subscribed");

        while let Some(message) = subscription.next().await {
            if let Err(e) = self.process_message(&message.payload).await {
                tracing::error!(error = %e, "failed to process bus message");
            }
        }

        info!(subject = %subject, "bus consumer stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudwatch_repository::{
        MemoryAlertStore, MemoryRuleStore, MemoryTransactionStore, TransactionStore,
    };
    use fraudwatch_runtime::{NullSink, RiskScorer};

    fn consumer() -> (IngestConsumer, Arc<MemoryTransactionStore>) {
        let transactions = Arc::new(MemoryTransactionStore::new());
        let pipeline = IngestPipeline::new(
            RiskScorer::default(),
            transactions.clone(),
            Arc::new(MemoryAlertStore::new()),
            Arc::new(MemoryRuleStore::new()),
            Arc::new(NullSink),
        );
        (IngestConsumer::new(Arc::new(pipeline)), transactions)
    }

    fn created_envelope(id: &str) -> Vec<u8> {
        serde_json::json!({
            "eventType": "transaction.created",
            "transaction": { "transactionId": id, "userId": "user-1", "amount": 250.0 },
            "timestamp": "2024-05-14T12:00:00Z",
            "source": "payments-gateway"
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_creates_transaction_from_envelope() {
        let (consumer, transactions) = consumer();

        let outcome = consumer
            .process_message(&created_envelope("TXN1"))
            .await
            .unwrap();
        assert!(matches!(outcome, Some(IngestOutcome::Created { .. })));
        assert!(transactions.get("TXN1").await.is_ok());
    }

    #[tokio::test]
    async fn test_redelivery_is_silent_noop() {
        let (consumer, transactions) = consumer();

        consumer
            .process_message(&created_envelope("TXN1"))
            .await
            .unwrap();
        let outcome = consumer
            .process_message(&created_envelope("TXN1"))
            .await
            .unwrap();

        assert!(matches!(outcome, Some(IngestOutcome::Skipped { .. })));
        assert_eq!(transactions.len().await, 1);
    }

    #[tokio::test]
    async fn test_other_event_types_ignored() {
        let (consumer, transactions) = consumer();

        let payload = serde_json::json!({
            "eventType": "transaction.updated",
            "transaction": { "transactionId": "TXN1", "userId": "user-1", "amount": 1.0 },
            "timestamp": "2024-05-14T12:00:00Z",
            "source": "payments-gateway"
        })
        .to_string();

        let outcome = consumer.process_message(payload.as_bytes()).await.unwrap();
        assert!(outcome.is_none());
        assert!(transactions.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let (consumer, _) = consumer();
        let err = consumer.process_message(b"{ not json").await.unwrap_err();
        assert!(matches!(err, ConsumerError::Malformed(_)));
    }
}
