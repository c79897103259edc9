//! In-memory store implementations
//!
//! Backed by `tokio::sync::RwLock` maps. The transaction map enforces
//! `transactionId` uniqueness at insert time, which makes it the same
//! serialization point the database backend provides via a unique index.

use async_trait::async_trait;
use chrono::Utc;
use fraudwatch_core::{Alert, Rule, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{RepositoryError, RepositoryResult};
use crate::traits::{AlertQuery, AlertStore, RuleStore, TransactionQuery, TransactionStore};

/// In-memory transaction store
#[derive(Clone, Default)]
pub struct MemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions
    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    /// Returns true when the store is empty
    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn insert(&self, transaction: Transaction) -> RepositoryResult<Transaction> {
        let mut map = self.transactions.write().await;
        if map.contains_key(&transaction.transaction_id) {
            return Err(RepositoryError::Duplicate {
                transaction_id: transaction.transaction_id,
            });
        }
        map.insert(transaction.transaction_id.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn get(&self, transaction_id: &str) -> RepositoryResult<Transaction> {
        self.transactions
            .read()
            .await
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                id: transaction_id.to_string(),
            })
    }

    async fn update(&self, transaction: Transaction) -> RepositoryResult<Transaction> {
        let mut map = self.transactions.write().await;
        if !map.contains_key(&transaction.transaction_id) {
            return Err(RepositoryError::NotFound {
                id: transaction.transaction_id,
            });
        }
        map.insert(transaction.transaction_id.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn delete(&self, transaction_id: &str) -> RepositoryResult<Transaction> {
        self.transactions
            .write()
            .await
            .remove(transaction_id)
            .ok_or_else(|| RepositoryError::NotFound {
                id: transaction_id.to_string(),
            })
    }

    async fn list(&self, query: &TransactionQuery) -> RepositoryResult<Vec<Transaction>> {
        let map = self.transactions.read().await;
        let mut matching: Vec<Transaction> =
            map.values().filter(|t| query.matches(t)).cloned().collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count(&self, query: &TransactionQuery) -> RepositoryResult<usize> {
        let map = self.transactions.read().await;
        Ok(map.values().filter(|t| query.matches(t)).count())
    }
}

/// In-memory alert store
#[derive(Clone, Default)]
pub struct MemoryAlertStore {
    alerts: Arc<RwLock<HashMap<String, Alert>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn insert(&self, alert: Alert) -> RepositoryResult<Alert> {
        self.alerts
            .write()
            .await
            .insert(alert.id.clone(), alert.clone());
        Ok(alert)
    }

    async fn get(&self, id: &str) -> RepositoryResult<Alert> {
        self.alerts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })
    }

    async fn update(&self, alert: Alert) -> RepositoryResult<Alert> {
        let mut map = self.alerts.write().await;
        if !map.contains_key(&alert.id) {
            return Err(RepositoryError::NotFound { id: alert.id });
        }
        map.insert(alert.id.clone(), alert.clone());
        Ok(alert)
    }

    async fn delete(&self, id: &str) -> RepositoryResult<Alert> {
        self.alerts
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })
    }

    async fn list(&self, query: &AlertQuery) -> RepositoryResult<Vec<Alert>> {
        let map = self.alerts.read().await;
        let mut matching: Vec<Alert> = map.values().filter(|a| query.matches(a)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count(&self, query: &AlertQuery) -> RepositoryResult<usize> {
        let map = self.alerts.read().await;
        Ok(map.values().filter(|a| query.matches(a)).count())
    }
}

/// In-memory rule store
///
/// Rules are kept in insertion order; `active_rules` applies the evaluation
/// ordering (priority descending, creation time ascending).
#[derive(Clone, Default)]
pub struct MemoryRuleStore {
    rules: Arc<RwLock<Vec<Rule>>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-seeded with rules
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: Arc::new(RwLock::new(rules)),
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn insert(&self, rule: Rule) -> RepositoryResult<Rule> {
        self.rules.write().await.push(rule.clone());
        Ok(rule)
    }

    async fn active_rules(&self) -> RepositoryResult<Vec<Rule>> {
        let rules = self.rules.read().await;
        let mut active: Vec<Rule> = rules.iter().filter(|r| r.active).cloned().collect();
        active.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(active)
    }

    async fn record_execution(&self, names: &[String]) -> RepositoryResult<()> {
        let now = Utc::now();
        let mut rules = self.rules.write().await;
        for rule in rules.iter_mut() {
            if names.iter().any(|n| n == &rule.name) {
                rule.execution_count += 1;
                rule.last_executed = Some(now);
            }
        }
        Ok(())
    }

    async fn all(&self) -> RepositoryResult<Vec<Rule>> {
        Ok(self.rules.read().await.clone())
    }
}
