//! Domain events emitted after committed mutations
//!
//! Every event carries the full entity it refers to and knows how it maps
//! onto the two delivery surfaces: the real-time stream (frame type +
//! subscription channel) and the message-bus topics (dotted event type).

use crate::alert::Alert;
use crate::transaction::Transaction;
use serde::Serialize;

/// Subscription channel for real-time clients
pub const CHANNEL_TRANSACTIONS: &str = "transactions";
/// Subscription channel for alert consumers
pub const CHANNEL_ALERTS: &str = "alerts";

/// A committed domain mutation
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    TransactionCreated(Transaction),
    TransactionUpdated(Transaction),
    TransactionDeleted { transaction_id: String },
    AlertCreated(Alert),
    AlertAcknowledged(Alert),
    AlertResolved(Alert),
    AlertDismissed(Alert),
}

impl DomainEvent {
    /// Frame type used in real-time broadcast envelopes
    pub fn stream_type(&self) -> &'static str {
        match self {
            DomainEvent::TransactionCreated(_) => "transaction",
            DomainEvent::TransactionUpdated(_) => "transaction_update",
            DomainEvent::TransactionDeleted { .. } => "transaction_delete",
            DomainEvent::AlertCreated(_) => "alert_created",
            DomainEvent::AlertAcknowledged(_) => "alert_acknowledged",
            DomainEvent::AlertResolved(_) => "alert_resolved",
            DomainEvent::AlertDismissed(_) => "alert_dismissed",
        }
    }

    /// Subscription channel the event belongs to
    pub fn channel(&self) -> &'static str {
        match self {
            DomainEvent::TransactionCreated(_)
            | DomainEvent::TransactionUpdated(_)
            | DomainEvent::TransactionDeleted { .. } => CHANNEL_TRANSACTIONS,
            _ => CHANNEL_ALERTS,
        }
    }

    /// Dotted event type used in message-bus envelopes
    pub fn bus_event_type(&self) -> &'static str {
        match self {
            DomainEvent::TransactionCreated(_) => "transaction.created",
            DomainEvent::TransactionUpdated(_) => "transaction.updated",
            DomainEvent::TransactionDeleted { .. } => "transaction.deleted",
            DomainEvent::AlertCreated(_) => "alert.created",
            DomainEvent::AlertAcknowledged(_) => "alert.acknowledged",
            DomainEvent::AlertResolved(_) => "alert.resolved",
            DomainEvent::AlertDismissed(_) => "alert.dismissed",
        }
    }

    /// Message key: the external transaction identifier
    pub fn key(&self) -> &str {
        match self {
            DomainEvent::TransactionCreated(txn) | DomainEvent::TransactionUpdated(txn) => {
                &txn.transaction_id
            }
            DomainEvent::TransactionDeleted { transaction_id } => transaction_id,
            DomainEvent::AlertCreated(alert)
            | DomainEvent::AlertAcknowledged(alert)
            | DomainEvent::AlertResolved(alert)
            | DomainEvent::AlertDismissed(alert) => &alert.transaction_id,
        }
    }

    /// Serialized payload carried in broadcast envelopes
    pub fn payload(&self) -> serde_json::Value {
        match self {
            DomainEvent::TransactionCreated(txn) | DomainEvent::TransactionUpdated(txn) => {
                serde_json::to_value(txn).unwrap_or(serde_json::Value::Null)
            }
            DomainEvent::TransactionDeleted { transaction_id } => {
                serde_json::json!({ "id": transaction_id })
            }
            DomainEvent::AlertCreated(alert)
            | DomainEvent::AlertAcknowledged(alert)
            | DomainEvent::AlertResolved(alert)
            | DomainEvent::AlertDismissed(alert) => {
                serde_json::to_value(alert).unwrap_or(serde_json::Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Severity, TransactionDraft};

    fn sample_transaction() -> Transaction {
        TransactionDraft::new("user-1", 100.0)
            .with_transaction_id("TXN9")
            .into_transaction("system")
    }

    #[test]
    fn test_transaction_event_mapping() {
        let event = DomainEvent::TransactionCreated(sample_transaction());
        assert_eq!(event.stream_type(), "transaction");
        assert_eq!(event.channel(), CHANNEL_TRANSACTIONS);
        assert_eq!(event.bus_event_type(), "transaction.created");
        assert_eq!(event.key(), "TXN9");
    }

    #[test]
    fn test_alert_event_mapping() {
        let txn = sample_transaction();
        let alert = Alert::new(&txn, "msg".to_string(), Severity::Medium);
        let event = DomainEvent::AlertAcknowledged(alert);

        assert_eq!(event.stream_type(), "alert_acknowledged");
        assert_eq!(event.channel(), CHANNEL_ALERTS);
        assert_eq!(event.bus_event_type(), "alert.acknowledged");
        assert_eq!(event.key(), "TXN9");
    }

    #[test]
    fn test_delete_event_payload() {
        let event = DomainEvent::TransactionDeleted {
            transaction_id: "TXN9".to_string(),
        };
        assert_eq!(event.stream_type(), "transaction_delete");
        assert_eq!(event.payload(), serde_json::json!({ "id": "TXN9" }));
    }
}
