//! Alert domain model
//!
//! Alerts are created exclusively by the alert generator when a persisted
//! transaction crosses the risk thresholds, and mutated only through the
//! lifecycle manager. The state machine is monotonic toward a terminal
//! state: ACTIVE -> (ACKNOWLEDGED) -> RESOLVED | DISMISSED.

use crate::transaction::{Severity, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    #[default]
    Active,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::Dismissed)
    }
}

/// An alert raised against a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Internal alert identifier
    pub id: String,
    /// The transaction this alert references
    pub transaction_id: String,
    /// Human-readable description of the trigger
    pub message: String,
    pub severity: Severity,
    pub status: AlertStatus,
    /// Snapshot of the transaction amount at creation time
    pub transaction_amount: f64,
    /// Snapshot of the risk score at creation time
    pub transaction_risk_score: u8,
    /// Snapshot of the owning user at creation time
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Create a new ACTIVE alert referencing a persisted transaction
    pub fn new(transaction: &Transaction, message: String, severity: Severity) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            "transactionStatus".to_string(),
            serde_json::to_value(transaction.status).unwrap_or(serde_json::Value::Null),
        );
        if let Some(merchant_id) = &transaction.merchant_id {
            metadata.insert(
                "merchantId".to_string(),
                serde_json::Value::String(merchant_id.clone()),
            );
        }
        metadata.insert(
            "paymentMethod".to_string(),
            serde_json::to_value(transaction.payment_method).unwrap_or(serde_json::Value::Null),
        );
        metadata.insert(
            "location".to_string(),
            serde_json::to_value(&transaction.location).unwrap_or(serde_json::Value::Null),
        );

        Self {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction.transaction_id.clone(),
            message,
            severity,
            status: AlertStatus::Active,
            transaction_amount: transaction.amount,
            transaction_risk_score: transaction.risk_score,
            user_id: transaction.user_id.clone(),
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_by: None,
            resolved_at: None,
            notes: None,
            metadata,
            created_at: Utc::now(),
        }
    }
}
