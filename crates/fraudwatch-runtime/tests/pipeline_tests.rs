//! End-to-end pipeline tests over in-memory stores

use fraudwatch_core::{
    Condition, ConditionOperator, Rule, RuleAction, Severity, TransactionDraft, TransactionStatus,
    Value,
};
use fraudwatch_repository::{
    AlertQuery, AlertStore, MemoryAlertStore, MemoryRuleStore, MemoryTransactionStore, RuleStore,
    TransactionStore,
};
use fraudwatch_runtime::{
    DuplicatePolicy, IngestOutcome, IngestPipeline, RecordingSink, RiskScorer, RuntimeError,
};
use std::sync::Arc;

struct Harness {
    pipeline: IngestPipeline,
    transactions: Arc<MemoryTransactionStore>,
    alerts: Arc<MemoryAlertStore>,
    rules: Arc<MemoryRuleStore>,
    sink: RecordingSink,
}

fn harness() -> Harness {
    let transactions = Arc::new(MemoryTransactionStore::new());
    let alerts = Arc::new(MemoryAlertStore::new());
    let rules = Arc::new(MemoryRuleStore::new());
    let sink = RecordingSink::new();

    let pipeline = IngestPipeline::new(
        RiskScorer::default(),
        transactions.clone(),
        alerts.clone(),
        rules.clone(),
        Arc::new(sink.clone()),
    );

    Harness {
        pipeline,
        transactions,
        alerts,
        rules,
        sink,
    }
}

fn created(outcome: IngestOutcome) -> (fraudwatch_core::Transaction, Option<fraudwatch_core::Alert>) {
    match outcome {
        IngestOutcome::Created { transaction, alert } => (transaction, alert),
        other => panic!("expected Created, got {:?}", other),
    }
}

#[tokio::test]
async fn high_amount_low_score_yields_safe_with_medium_alert() {
    let h = harness();

    let draft = TransactionDraft::new("user-1", 60_000.0)
        .with_transaction_id("TXN1")
        .with_risk_score(0);
    let (txn, alert) = created(
        h.pipeline
            .ingest(draft, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );

    assert_eq!(txn.status, TransactionStatus::Safe);
    let alert = alert.expect("amount above threshold must alert");
    assert_eq!(alert.severity, Severity::Medium);
    assert_eq!(alert.transaction_id, "TXN1");

    // Persisted on both sides
    assert!(h.transactions.get("TXN1").await.is_ok());
    let mut query = AlertQuery::new();
    query.transaction_id = Some("TXN1".to_string());
    assert_eq!(h.alerts.list(&query).await.unwrap().len(), 1);

    // Fan-out saw the transaction then the alert
    let events = h.sink.recorded();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stream_type(), "transaction");
    assert_eq!(events[1].stream_type(), "alert_created");
}

#[tokio::test]
async fn high_score_low_amount_yields_fraud_with_critical_alert() {
    let h = harness();

    let draft = TransactionDraft::new("user-2", 500.0)
        .with_transaction_id("TXN2")
        .with_risk_score(95);
    let (txn, alert) = created(
        h.pipeline
            .ingest(draft, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );

    assert_eq!(txn.status, TransactionStatus::Fraud);
    let alert = alert.expect("score above threshold must alert");
    assert_eq!(alert.severity, Severity::Critical);
}

#[tokio::test]
async fn scorer_runs_only_when_score_absent() {
    let h = harness();

    // Explicit score 0 is honored even though the heuristic would not be 0
    let explicit = TransactionDraft::new("user-1", 20_000.0)
        .with_transaction_id("EXPLICIT")
        .with_risk_score(0);
    let (txn, _) = created(
        h.pipeline
            .ingest(explicit, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );
    assert_eq!(txn.risk_score, 0);

    let scored = TransactionDraft::new("user-1", 20_000.0).with_transaction_id("SCORED");
    let (txn, _) = created(
        h.pipeline
            .ingest(scored, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );
    assert!(txn.risk_score > 0);
}

#[tokio::test]
async fn duplicate_on_api_path_conflicts_and_keeps_one_record() {
    let h = harness();

    let first = TransactionDraft::new("user-1", 100.0).with_transaction_id("TXN1");
    created(
        h.pipeline
            .ingest(first, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );

    let second = TransactionDraft::new("user-1", 999.0).with_transaction_id("TXN1");
    let err = h
        .pipeline
        .ingest(second, DuplicatePolicy::Reject, "api")
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Duplicate { .. }));

    assert_eq!(h.transactions.len().await, 1);
    assert_eq!(h.transactions.get("TXN1").await.unwrap().amount, 100.0);
}

#[tokio::test]
async fn duplicate_on_consumer_path_skips_silently() {
    let h = harness();

    let first = TransactionDraft::new("user-1", 100.0).with_transaction_id("TXN1");
    created(
        h.pipeline
            .ingest(first, DuplicatePolicy::Skip, "consumer")
            .await
            .unwrap(),
    );
    let events_after_first = h.sink.len();

    let redelivery = TransactionDraft::new("user-1", 100.0).with_transaction_id("TXN1");
    let outcome = h
        .pipeline
        .ingest(redelivery, DuplicatePolicy::Skip, "consumer")
        .await
        .unwrap();

    match outcome {
        IngestOutcome::Skipped { transaction_id } => assert_eq!(transaction_id, "TXN1"),
        other => panic!("expected Skipped, got {:?}", other),
    }

    // Exactly one record, no additional fan-out from the redelivery
    assert_eq!(h.transactions.len().await, 1);
    assert_eq!(h.sink.len(), events_after_first);
}

#[tokio::test]
async fn rule_priority_order_last_writer_wins() {
    let h = harness();

    let review = Rule::new("review_first", 9)
        .with_condition(Condition::new(
            "amount",
            ConditionOperator::GreaterThan,
            Value::Number(0.0),
        ))
        .with_action(RuleAction::Review)
        .with_action(RuleAction::Flag {
            kind: None,
            reason: None,
            severity: None,
        });
    let block = Rule::new("block_last", 1)
        .with_condition(Condition::new(
            "amount",
            ConditionOperator::GreaterThan,
            Value::Number(0.0),
        ))
        .with_action(RuleAction::Block)
        .with_action(RuleAction::Flag {
            kind: None,
            reason: None,
            severity: None,
        });
    h.rules.insert(review).await.unwrap();
    h.rules.insert(block).await.unwrap();

    let draft = TransactionDraft::new("user-1", 100.0)
        .with_transaction_id("TXN1")
        .with_risk_score(0);
    let (txn, _) = created(
        h.pipeline
            .ingest(draft, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );

    assert_eq!(txn.status, TransactionStatus::Fraud);
    assert_eq!(txn.flags.len(), 2);
    assert_eq!(txn.flags[0].reason, "Rule: review_first");
    assert_eq!(txn.flags[1].reason, "Rule: block_last");
}

#[tokio::test]
async fn fired_rules_update_execution_counters() {
    let h = harness();

    let fires = Rule::new("fires", 5).with_condition(Condition::new(
        "amount",
        ConditionOperator::GreaterThan,
        Value::Number(50.0),
    ));
    let dormant = Rule::new("dormant", 5).with_condition(Condition::new(
        "amount",
        ConditionOperator::GreaterThan,
        Value::Number(1_000_000.0),
    ));
    h.rules.insert(fires).await.unwrap();
    h.rules.insert(dormant).await.unwrap();

    let draft = TransactionDraft::new("user-1", 100.0).with_transaction_id("TXN1");
    created(
        h.pipeline
            .ingest(draft, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );

    let rules = h.rules.all().await.unwrap();
    assert_eq!(
        rules.iter().find(|r| r.name == "fires").unwrap().execution_count,
        1
    );
    assert_eq!(
        rules
            .iter()
            .find(|r| r.name == "dormant")
            .unwrap()
            .execution_count,
        0
    );
}

#[tokio::test]
async fn score_adjustment_drives_classification() {
    let h = harness();

    let boost = Rule::new("boost", 5)
        .with_condition(Condition::new(
            "paymentMethod",
            ConditionOperator::Equals,
            Value::String("DIGITAL_WALLET".to_string()),
        ))
        .with_action(RuleAction::ScoreAdjustment { adjustment: 60 });
    h.rules.insert(boost).await.unwrap();

    let draft = TransactionDraft::new("user-1", 100.0)
        .with_transaction_id("TXN1")
        .with_risk_score(0)
        .with_payment_method(fraudwatch_core::PaymentMethod::DigitalWallet);
    let (txn, _) = created(
        h.pipeline
            .ingest(draft, DuplicatePolicy::Reject, "api")
            .await
            .unwrap(),
    );

    assert_eq!(txn.risk_score, 60);
    assert_eq!(txn.status, TransactionStatus::Suspicious);
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_any_side_effect() {
    let h = harness();

    let draft = TransactionDraft::new("user-1", -5.0).with_transaction_id("TXN1");
    let err = h
        .pipeline
        .ingest(draft, DuplicatePolicy::Reject, "api")
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::Validation(_)));
    assert!(h.transactions.is_empty().await);
    assert!(h.sink.is_empty());
}
