//! Store trait definitions
//!
//! Three stores back the pipeline:
//!
//! - [`TransactionStore`]: transactions, unique on the external id
//! - [`AlertStore`]: alerts keyed by internal id
//! - [`RuleStore`]: the rule set and its execution counters
//!
//! All operations are async and implementations must be `Send + Sync` for
//! use across tasks.

use async_trait::async_trait;
use fraudwatch_core::{Alert, AlertStatus, Rule, Severity, Transaction, TransactionStatus};

use crate::RepositoryResult;

/// Filters for listing transactions
///
/// Results are ordered by transaction timestamp, newest first.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub status: Option<TransactionStatus>,
    pub user_id: Option<String>,
    pub merchant_id: Option<String>,
    pub min_risk_score: Option<u8>,
    pub max_risk_score: Option<u8>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub limit: usize,
    pub offset: usize,
}

impl TransactionQuery {
    /// Default page size used when the caller does not specify a limit
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            ..Default::default()
        }
    }

    /// Returns true when the transaction passes every set filter
    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(status) = self.status {
            if txn.status != status {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &txn.user_id != user_id {
                return false;
            }
        }
        if let Some(merchant_id) = &self.merchant_id {
            if txn.merchant_id.as_ref() != Some(merchant_id) {
                return false;
            }
        }
        if let Some(min) = self.min_risk_score {
            if txn.risk_score < min {
                return false;
            }
        }
        if let Some(max) = self.max_risk_score {
            if txn.risk_score > max {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if txn.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if txn.amount > max {
                return false;
            }
        }
        true
    }
}

/// Filters for listing alerts
///
/// Results are ordered by creation time, newest first.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub status: Option<AlertStatus>,
    pub severity: Option<Severity>,
    pub transaction_id: Option<String>,
    pub user_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl AlertQuery {
    pub fn new() -> Self {
        Self {
            limit: TransactionQuery::DEFAULT_LIMIT,
            ..Default::default()
        }
    }

    /// Returns true when the alert passes every set filter
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(status) = self.status {
            if alert.status != status {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if alert.severity != severity {
                return false;
            }
        }
        if let Some(transaction_id) = &self.transaction_id {
            if &alert.transaction_id != transaction_id {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &alert.user_id != user_id {
                return false;
            }
        }
        true
    }
}

/// Transaction persistence
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new transaction
    ///
    /// The insert is atomic on `transactionId`; a second insert with the same
    /// identifier fails with [`crate::RepositoryError::Duplicate`].
    async fn insert(&self, transaction: Transaction) -> RepositoryResult<Transaction>;

    /// Fetch a transaction by its external identifier
    async fn get(&self, transaction_id: &str) -> RepositoryResult<Transaction>;

    /// Replace an existing transaction
    async fn update(&self, transaction: Transaction) -> RepositoryResult<Transaction>;

    /// Delete a transaction, returning the removed record
    async fn delete(&self, transaction_id: &str) -> RepositoryResult<Transaction>;

    /// List transactions matching the query, newest first
    async fn list(&self, query: &TransactionQuery) -> RepositoryResult<Vec<Transaction>>;

    /// Count transactions matching the query (ignoring pagination)
    async fn count(&self, query: &TransactionQuery) -> RepositoryResult<usize>;
}

/// Alert persistence
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert a new alert
    async fn insert(&self, alert: Alert) -> RepositoryResult<Alert>;

    /// Fetch an alert by id
    async fn get(&self, id: &str) -> RepositoryResult<Alert>;

    /// Replace an existing alert
    async fn update(&self, alert: Alert) -> RepositoryResult<Alert>;

    /// Delete an alert, returning the removed record
    async fn delete(&self, id: &str) -> RepositoryResult<Alert>;

    /// List alerts matching the query, newest first
    async fn list(&self, query: &AlertQuery) -> RepositoryResult<Vec<Alert>>;

    /// Count alerts matching the query (ignoring pagination)
    async fn count(&self, query: &AlertQuery) -> RepositoryResult<usize>;
}

/// Rule persistence
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Insert a rule
    async fn insert(&self, rule: Rule) -> RepositoryResult<Rule>;

    /// Active rules ordered by priority descending, then creation time
    /// ascending (stable tie-break)
    async fn active_rules(&self) -> RepositoryResult<Vec<Rule>>;

    /// Increment execution counters and stamp `lastExecuted` for the named
    /// rules; unknown names are ignored
    async fn record_execution(&self, names: &[String]) -> RepositoryResult<()>;

    /// All rules, in creation order
    async fn all(&self) -> RepositoryResult<Vec<Rule>>;
}
