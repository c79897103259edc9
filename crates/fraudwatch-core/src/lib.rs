//! Fraudwatch Core - Domain types for the transaction monitoring service
//!
//! This crate defines the shared domain model: transactions and their
//! classification, the declarative rule model evaluated against them,
//! alerts with their lifecycle states, and the domain events emitted
//! after committed mutations.

pub mod alert;
pub mod error;
pub mod event;
pub mod rule;
pub mod transaction;
pub mod value;

pub use alert::{Alert, AlertStatus};
pub use error::{CoreError, CoreResult};
pub use event::{DomainEvent, CHANNEL_ALERTS, CHANNEL_TRANSACTIONS};
pub use rule::{Condition, ConditionOperator, Rule, RuleAction};
pub use transaction::{
    Location, PaymentMethod, Severity, Transaction, TransactionDraft, TransactionFlag,
    TransactionStatus, MAX_RISK_SCORE,
};
pub use value::Value;
