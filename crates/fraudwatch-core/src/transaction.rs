//! Transaction domain model
//!
//! A transaction arrives as a [`TransactionDraft`] (from the HTTP boundary or
//! the message-bus consumer), is mutated by the rule engine, and is committed
//! as a [`Transaction`]. The external `transactionId` is the idempotency key:
//! the persistence layer enforces its uniqueness.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum risk score; scores are always clamped to `[0, MAX_RISK_SCORE]`.
pub const MAX_RISK_SCORE: u8 = 100;

/// Classification assigned to a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Safe,
    Suspicious,
    Fraud,
}

/// Payment instrument used for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    DigitalWallet,
    #[default]
    Other,
}

/// Severity tier shared by transaction flags and alerts
///
/// Ordering is by urgency: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Geographic origin of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// A flag appended to a transaction by a fired rule
///
/// Flags accumulate across rules and are never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFlag {
    /// Flag category (e.g. "RULE_VIOLATION")
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable reason
    pub reason: String,
    /// Severity of the flag
    pub severity: Severity,
    /// When the flag was appended
    pub timestamp: DateTime<Utc>,
}

/// A persisted financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// External identifier, globally unique (the idempotency key)
    pub transaction_id: String,
    /// Owning user
    pub user_id: String,
    /// Monetary amount (>= 0)
    pub amount: f64,
    /// ISO currency code, uppercase
    pub currency: String,
    /// When the transaction happened
    pub timestamp: DateTime<Utc>,
    /// Final classification
    pub status: TransactionStatus,
    /// Risk score in [0, 100]
    pub risk_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Flags appended by rule actions, in firing order
    #[serde(default)]
    pub flags: Vec<TransactionFlag>,
    /// Reviewer who last re-classified the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Transaction {
    /// Clamp an arbitrary signed score into the valid range
    pub fn clamp_score(score: i64) -> u8 {
        score.clamp(0, MAX_RISK_SCORE as i64) as u8
    }

    /// Record a reviewer re-classification
    pub fn review(&mut self, status: TransactionStatus, reviewer: &str, notes: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.reviewed_by = Some(reviewer.to_string());
        self.reviewed_at = Some(now);
        if notes.is_some() {
            self.notes = notes;
        }
        self.updated_at = now;
        self.updated_by = Some(reviewer.to_string());
    }
}

/// An in-memory working copy of a transaction, prior to persistence
///
/// The rule engine mutates the draft (score adjustments, forced status,
/// appended flags) before it is committed as a [`Transaction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    /// External identifier; generated when absent
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub user_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Caller-supplied status; `None` means "derive from the score"
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    /// Caller-supplied score; `None` means "run the risk scorer"
    #[serde(default)]
    pub risk_score: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Flags accumulated during rule evaluation
    #[serde(default)]
    pub flags: Vec<TransactionFlag>,
}

impl TransactionDraft {
    /// Create a minimal draft
    pub fn new(user_id: impl Into<String>, amount: f64) -> Self {
        Self {
            transaction_id: None,
            user_id: user_id.into(),
            amount,
            currency: default_currency(),
            timestamp: None,
            status: None,
            risk_score: None,
            description: None,
            merchant_id: None,
            merchant_name: None,
            payment_method: PaymentMethod::default(),
            location: Location::default(),
            metadata: HashMap::new(),
            flags: Vec::new(),
        }
    }

    /// Set the external transaction id
    pub fn with_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    /// Set an explicit risk score (bypasses the scorer)
    pub fn with_risk_score(mut self, score: u8) -> Self {
        self.risk_score = Some(score);
        self
    }

    /// Set the payment method
    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Append a flag to the draft
    pub fn add_flag(&mut self, kind: String, reason: String, severity: Severity) {
        self.flags.push(TransactionFlag {
            kind,
            reason,
            severity,
            timestamp: Utc::now(),
        });
    }

    /// Validate caller-supplied fields
    pub fn validate(&self) -> CoreResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(CoreError::invalid_value("userId", "must not be empty"));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(CoreError::invalid_value(
                "amount",
                "must be a non-negative number",
            ));
        }
        if let Some(id) = &self.transaction_id {
            if id.trim().is_empty() {
                return Err(CoreError::invalid_value(
                    "transactionId",
                    "must not be empty",
                ));
            }
        }
        if let Some(score) = self.risk_score {
            if score > MAX_RISK_SCORE {
                return Err(CoreError::invalid_value(
                    "riskScore",
                    "must be between 0 and 100",
                ));
            }
        }
        Ok(())
    }

    /// Commit the draft into a transaction record
    ///
    /// Missing ids are generated, missing timestamps default to now, and the
    /// score defaults to zero if the pipeline never resolved one.
    pub fn into_transaction(self, actor: &str) -> Transaction {
        let now = Utc::now();
        Transaction {
            transaction_id: self
                .transaction_id
                .unwrap_or_else(generate_transaction_id),
            user_id: self.user_id,
            amount: self.amount,
            currency: self.currency.to_uppercase(),
            timestamp: self.timestamp.unwrap_or(now),
            status: self.status.unwrap_or_default(),
            risk_score: self.risk_score.unwrap_or(0),
            description: self.description,
            merchant_id: self.merchant_id,
            merchant_name: self.merchant_name,
            payment_method: self.payment_method,
            location: self.location,
            metadata: self.metadata,
            flags: self.flags,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
            created_by: actor.to_string(),
            updated_by: None,
        }
    }
}

/// Generate an external transaction identifier
pub fn generate_transaction_id() -> String {
    format!("TXN_{}", Uuid::new_v4().simple())
}

fn default_currency() -> String {
    "USD".to_string()
}
