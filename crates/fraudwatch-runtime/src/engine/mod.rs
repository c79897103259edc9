//! Rule engine
//!
//! Evaluates the active rule set against a transaction draft. Rules are
//! visited in priority order (descending, creation-order tie-break); within
//! a rule all conditions are ANDed, and a firing rule's actions are applied
//! to the draft in declared order. A lower-priority rule may overwrite a
//! forced status (last writer wins) while flags always accumulate.

mod field_lookup;
mod operators;

use fraudwatch_core::{
    Rule, RuleAction, Severity, Transaction, TransactionDraft, TransactionStatus, Value,
};
use tracing::debug;

/// Result of evaluating a rule set against a draft
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    /// Names of the rules that fired, in evaluation order
    pub fired_rules: Vec<String>,
    /// Status forced by a `block`/`review` action, if any (last writer wins)
    pub forced_status: Option<TransactionStatus>,
}

/// The rule engine
///
/// Stateless: rule ordering comes from the store, counters are recorded by
/// the caller through the rule store after evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate rules against the draft, mutating it in place
    ///
    /// `rules` must already be ordered by priority descending (the rule
    /// store's `active_rules` contract).
    pub fn evaluate(&self, rules: &[Rule], draft: &mut TransactionDraft) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::default();

        for rule in rules {
            if !rule.active {
                continue;
            }
            // Snapshot per rule: earlier actions must be visible to later rules
            let snapshot = draft_snapshot(draft);
            if !conditions_match(rule, &snapshot) {
                continue;
            }

            debug!(rule = %rule.name, priority = rule.priority, "rule fired");
            outcome.fired_rules.push(rule.name.clone());

            for action in &rule.actions {
                apply_action(rule, action, draft, &mut outcome);
            }
        }

        outcome
    }
}

fn conditions_match(rule: &Rule, snapshot: &std::collections::HashMap<String, Value>) -> bool {
    rule.conditions.iter().all(|condition| {
        let field_value = field_lookup::lookup_path(snapshot, &condition.field);
        operators::evaluate_operator(&field_value, condition.operator, &condition.value)
    })
}

fn apply_action(
    rule: &Rule,
    action: &RuleAction,
    draft: &mut TransactionDraft,
    outcome: &mut EvaluationOutcome,
) {
    match action {
        RuleAction::Flag {
            kind,
            reason,
            severity,
        } => {
            draft.add_flag(
                kind.clone().unwrap_or_else(|| "RULE_VIOLATION".to_string()),
                reason
                    .clone()
                    .unwrap_or_else(|| format!("Rule: {}", rule.name)),
                severity.unwrap_or(Severity::Medium),
            );
        }
        RuleAction::ScoreAdjustment { adjustment } => {
            let current = draft.risk_score.unwrap_or(0) as i64;
            draft.risk_score = Some(Transaction::clamp_score(current + *adjustment as i64));
        }
        RuleAction::Block => {
            draft.status = Some(TransactionStatus::Fraud);
            outcome.forced_status = Some(TransactionStatus::Fraud);
        }
        RuleAction::Review => {
            draft.status = Some(TransactionStatus::Suspicious);
            outcome.forced_status = Some(TransactionStatus::Suspicious);
        }
        RuleAction::Alert => {
            // Alert creation is owned by the threshold-based generator
            debug!(rule = %rule.name, "alert action noted, deferred to generator");
        }
    }
}

/// Serialize the draft into the camelCase object rule paths address
fn draft_snapshot(draft: &TransactionDraft) -> std::collections::HashMap<String, Value> {
    match serde_json::to_value(draft).map(Value::from) {
        Ok(Value::Object(map)) => map,
        _ => std::collections::HashMap::new(),
    }
}
