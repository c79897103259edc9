//! Ingest pipeline
//!
//! Orchestrates the full evaluation of an incoming transaction draft:
//! score (unless supplied) -> rule engine -> status classification ->
//! atomic persist -> execution counters -> alert generation -> event
//! fan-out. The persistence insert is the only fatal step after validation;
//! counters, alerts and notifications are best-effort side effects of an
//! already-committed write.

use crate::alerts::AlertGenerator;
use crate::classify;
use crate::engine::RuleEngine;
use crate::error::{Result, RuntimeError};
use crate::scoring::RiskScorer;
use crate::sink::EventSink;
use chrono::Utc;
use fraudwatch_core::{Alert, DomainEvent, Transaction, TransactionDraft};
use fraudwatch_repository::{AlertStore, RuleStore, TransactionStore};
use std::sync::Arc;
use tracing::{error, info, warn};

/// How to treat a duplicate `transactionId` at persist time
///
/// The synchronous API rejects so the caller gets strict uniqueness
/// feedback; the message consumer skips so at-least-once redelivery is a
/// no-op rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Reject,
    Skip,
}

/// Result of an ingest attempt
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The transaction was persisted; `alert` is present when thresholds fired
    Created {
        transaction: Transaction,
        alert: Option<Alert>,
    },
    /// Duplicate id under [`DuplicatePolicy::Skip`]; nothing was persisted
    Skipped { transaction_id: String },
}

/// The risk-evaluation pipeline
#[derive(Clone)]
pub struct IngestPipeline {
    scorer: RiskScorer,
    engine: RuleEngine,
    generator: AlertGenerator,
    transactions: Arc<dyn TransactionStore>,
    alerts: Arc<dyn AlertStore>,
    rules: Arc<dyn RuleStore>,
    sink: Arc<dyn EventSink>,
}

impl IngestPipeline {
    pub fn new(
        scorer: RiskScorer,
        transactions: Arc<dyn TransactionStore>,
        alerts: Arc<dyn AlertStore>,
        rules: Arc<dyn RuleStore>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            scorer,
            engine: RuleEngine::new(),
            generator: AlertGenerator::new(),
            transactions,
            alerts,
            rules,
            sink,
        }
    }

    /// Run a draft through the full pipeline
    pub async fn ingest(
        &self,
        mut draft: TransactionDraft,
        policy: DuplicatePolicy,
        actor: &str,
    ) -> Result<IngestOutcome> {
        draft.validate()?;

        if draft.timestamp.is_none() {
            draft.timestamp = Some(Utc::now());
        }
        if draft.risk_score.is_none() {
            draft.risk_score = Some(self.scorer.score(&draft));
        }

        let rules = self.rules.active_rules().await.map_err(RuntimeError::Store)?;
        let evaluation = self.engine.evaluate(&rules, &mut draft);

        let score = draft.risk_score.unwrap_or(0);
        draft.status = Some(classify::resolve_status(draft.status, score));

        let transaction = draft.into_transaction(actor);
        let transaction = match self.transactions.insert(transaction).await {
            Ok(persisted) => persisted,
            Err(err) if err.is_duplicate() => {
                return match policy {
                    DuplicatePolicy::Reject => Err(err.into()),
                    DuplicatePolicy::Skip => {
                        let transaction_id = match err {
                            fraudwatch_repository::RepositoryError::Duplicate {
                                transaction_id,
                            } => transaction_id,
                            _ => unreachable!(),
                        };
                        info!(%transaction_id, "duplicate transaction, skipping");
                        Ok(IngestOutcome::Skipped { transaction_id })
                    }
                };
            }
            Err(err) => return Err(RuntimeError::Store(err)),
        };

        // Committed from here on; everything below is best-effort
        if !evaluation.fired_rules.is_empty() {
            if let Err(e) = self.rules.record_execution(&evaluation.fired_rules).await {
                warn!(error = %e, "failed to record rule executions");
            }
        }

        let alert = match self.generator.evaluate(&transaction) {
            Some(alert) => match self.alerts.insert(alert).await {
                Ok(stored) => Some(stored),
                Err(e) => {
                    error!(
                        transaction_id = %transaction.transaction_id,
                        error = %e,
                        "failed to persist alert"
                    );
                    None
                }
            },
            None => None,
        };

        self.notify(DomainEvent::TransactionCreated(transaction.clone()))
            .await;
        if let Some(alert) = &alert {
            self.notify(DomainEvent::AlertCreated(alert.clone())).await;
        }

        Ok(IngestOutcome::Created { transaction, alert })
    }

    async fn notify(&self, event: DomainEvent) {
        if let Err(e) = self.sink.notify(event).await {
            warn!(error = %e, "failed to notify event sink");
        }
    }
}
