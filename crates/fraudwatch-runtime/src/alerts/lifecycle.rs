//! Alert lifecycle state machine
//!
//! States: ACTIVE (initial) -> ACKNOWLEDGED (optional) -> RESOLVED |
//! DISMISSED (terminal). Transitions out of a terminal state are rejected.
//! Each successful transition is one persisted update followed by a
//! best-effort sink notification carrying the full updated alert.

use crate::error::{Result, RuntimeError};
use crate::sink::EventSink;
use chrono::Utc;
use fraudwatch_core::{Alert, AlertStatus, DomainEvent};
use fraudwatch_repository::AlertStore;
use std::sync::Arc;
use tracing::warn;

/// Enforces the alert state machine and audit trail
#[derive(Clone)]
pub struct AlertLifecycle {
    alerts: Arc<dyn AlertStore>,
    sink: Arc<dyn EventSink>,
}

impl AlertLifecycle {
    pub fn new(alerts: Arc<dyn AlertStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { alerts, sink }
    }

    /// ACTIVE -> ACKNOWLEDGED, recording the actor and timestamp
    pub async fn acknowledge(&self, id: &str, actor: &str) -> Result<Alert> {
        let mut alert = self.alerts.get(id).await?;
        if alert.status != AlertStatus::Active {
            return Err(RuntimeError::InvalidTransition {
                action: "acknowledge",
                from: alert.status,
            });
        }

        alert.status = AlertStatus::Acknowledged;
        alert.acknowledged_by = Some(actor.to_string());
        alert.acknowledged_at = Some(Utc::now());

        let updated = self.alerts.update(alert).await?;
        self.notify(DomainEvent::AlertAcknowledged(updated.clone()))
            .await;
        Ok(updated)
    }

    /// Any non-terminal state -> RESOLVED
    pub async fn resolve(&self, id: &str, actor: &str, notes: Option<String>) -> Result<Alert> {
        self.close(id, actor, notes, AlertStatus::Resolved, "resolve")
            .await
    }

    /// Any non-terminal state -> DISMISSED
    pub async fn dismiss(&self, id: &str, actor: &str, notes: Option<String>) -> Result<Alert> {
        self.close(id, actor, notes, AlertStatus::Dismissed, "dismiss")
            .await
    }

    async fn close(
        &self,
        id: &str,
        actor: &str,
        notes: Option<String>,
        target: AlertStatus,
        action: &'static str,
    ) -> Result<Alert> {
        let mut alert = self.alerts.get(id).await?;
        if alert.status.is_terminal() {
            return Err(RuntimeError::InvalidTransition {
                action,
                from: alert.status,
            });
        }

        alert.status = target;
        alert.resolved_by = Some(actor.to_string());
        alert.resolved_at = Some(Utc::now());
        if notes.is_some() {
            alert.notes = notes;
        }

        let updated = self.alerts.update(alert).await?;
        let event = match target {
            AlertStatus::Resolved => DomainEvent::AlertResolved(updated.clone()),
            _ => DomainEvent::AlertDismissed(updated.clone()),
        };
        self.notify(event).await;
        Ok(updated)
    }

    async fn notify(&self, event: DomainEvent) {
        if let Err(e) = self.sink.notify(event).await {
            warn!(error = %e, "failed to notify event sink for alert transition");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use fraudwatch_core::{Severity, TransactionDraft};
    use fraudwatch_repository::MemoryAlertStore;

    async fn seeded() -> (AlertLifecycle, RecordingSink, String) {
        let store = Arc::new(MemoryAlertStore::new());
        let sink = RecordingSink::new();
        let lifecycle = AlertLifecycle::new(store.clone(), Arc::new(sink.clone()));

        let txn = TransactionDraft::new("user-1", 90_000.0)
            .with_transaction_id("TXN1")
            .into_transaction("test");
        let alert = Alert::new(&txn, "msg".to_string(), Severity::High);
        let id = alert.id.clone();
        store.insert(alert).await.unwrap();

        (lifecycle, sink, id)
    }

    #[tokio::test]
    async fn test_acknowledge_then_resolve() {
        let (lifecycle, sink, id) = seeded().await;

        let acked = lifecycle.acknowledge(&id, "analyst-1").await.unwrap();
        assert_eq!(acked.status, AlertStatus::Acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("analyst-1"));
        assert!(acked.acknowledged_at.is_some());

        let resolved = lifecycle
            .resolve(&id, "analyst-2", Some("false positive".to_string()))
            .await
            .unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("analyst-2"));
        assert_eq!(resolved.notes.as_deref(), Some("false positive"));

        let events = sink.recorded();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].stream_type(), "alert_acknowledged");
        assert_eq!(events[1].stream_type(), "alert_resolved");
    }

    #[tokio::test]
    async fn test_dismiss_from_active() {
        let (lifecycle, _sink, id) = seeded().await;
        let dismissed = lifecycle.dismiss(&id, "analyst-1", None).await.unwrap();
        assert_eq!(dismissed.status, AlertStatus::Dismissed);
        assert!(dismissed.notes.is_none());
    }

    #[tokio::test]
    async fn test_acknowledge_requires_active() {
        let (lifecycle, _sink, id) = seeded().await;
        lifecycle.resolve(&id, "analyst-1", None).await.unwrap();

        let err = lifecycle.acknowledge(&id, "analyst-2").await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidTransition {
                action: "acknowledge",
                from: AlertStatus::Resolved
            }
        ));
    }

    #[tokio::test]
    async fn test_terminal_states_are_final() {
        let (lifecycle, sink, id) = seeded().await;
        lifecycle.dismiss(&id, "analyst-1", None).await.unwrap();

        assert!(lifecycle.resolve(&id, "analyst-2", None).await.is_err());
        assert!(lifecycle.dismiss(&id, "analyst-2", None).await.is_err());
        // Only the first transition produced an event
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_alert() {
        let (lifecycle, _sink, _id) = seeded().await;
        let err = lifecycle.acknowledge("nope", "analyst-1").await.unwrap_err();
        assert!(matches!(err, RuntimeError::AlertNotFound { .. }));
    }
}
