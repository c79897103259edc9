//! Declarative rule model
//!
//! A rule is an ordered list of conditions (ANDed together) and an ordered
//! list of actions applied to the transaction draft when every condition
//! matches. Conditions reference draft fields by dotted path and compare
//! against a [`Value`] with a closed operator set; actions are a closed
//! tagged enum rather than free-form parameter maps.

use crate::transaction::Severity;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    /// Case-insensitive substring match
    Contains,
    NotContains,
    /// Membership in an array value
    In,
    NotIn,
}

impl ConditionOperator {
    /// Returns true for the ordering operators, which require numbers
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ConditionOperator::GreaterThan
                | ConditionOperator::LessThan
                | ConditionOperator::GreaterEqual
                | ConditionOperator::LessEqual
        )
    }
}

/// A single rule condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted field path into the draft (e.g. "location.country")
    pub field: String,
    pub operator: ConditionOperator,
    /// Comparison value
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Action applied to the draft when a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    /// Append a flag to the draft; defaults are filled from the rule name
    Flag {
        #[serde(default)]
        kind: Option<String>,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        severity: Option<Severity>,
    },
    /// Add a signed delta to the risk score, re-clamped to [0, 100]
    ScoreAdjustment { adjustment: i32 },
    /// Force status to FRAUD
    Block,
    /// Force status to SUSPICIOUS
    Review,
    /// Accepted for compatibility; alert creation is owned by the
    /// threshold-based generator, so this action does not mutate the draft
    Alert,
}

/// A declarative fraud rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique rule name
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Inactive rules are skipped by the engine
    #[serde(default = "default_active")]
    pub active: bool,
    /// 1-10; higher priority rules are evaluated first
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    /// Number of times the rule has fired
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_created_by")]
    pub created_by: String,
}

impl Rule {
    /// Create a new active rule
    pub fn new(name: impl Into<String>, priority: u8) -> Self {
        Self {
            name: name.into(),
            description: None,
            active: true,
            priority,
            conditions: Vec::new(),
            actions: Vec::new(),
            execution_count: 0,
            last_executed: None,
            created_at: Utc::now(),
            created_by: default_created_by(),
        }
    }

    /// Add a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an action
    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Deactivate the rule
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

fn default_active() -> bool {
    true
}

fn default_priority() -> u8 {
    1
}

fn default_created_by() -> String {
    "system".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_wire_format() {
        assert_eq!(
            serde_json::to_string(&ConditionOperator::GreaterEqual).unwrap(),
            "\"greater_equal\""
        );
        let op: ConditionOperator = serde_json::from_str("\"not_contains\"").unwrap();
        assert_eq!(op, ConditionOperator::NotContains);
    }

    #[test]
    fn test_operator_is_ordering() {
        assert!(ConditionOperator::GreaterThan.is_ordering());
        assert!(ConditionOperator::LessEqual.is_ordering());
        assert!(!ConditionOperator::Equals.is_ordering());
        assert!(!ConditionOperator::In.is_ordering());
    }

    #[test]
    fn test_action_tagged_format() {
        let action: RuleAction = serde_json::from_str(
            r#"{ "type": "score_adjustment", "adjustment": -20 }"#,
        )
        .unwrap();
        assert_eq!(action, RuleAction::ScoreAdjustment { adjustment: -20 });

        let block: RuleAction = serde_json::from_str(r#"{ "type": "block" }"#).unwrap();
        assert_eq!(block, RuleAction::Block);
    }

    #[test]
    fn test_flag_action_defaults() {
        let action: RuleAction = serde_json::from_str(r#"{ "type": "flag" }"#).unwrap();
        assert_eq!(
            action,
            RuleAction::Flag {
                kind: None,
                reason: None,
                severity: None
            }
        );
    }

    #[test]
    fn test_rule_builder() {
        let rule = Rule::new("high_amount_wallet", 8)
            .with_condition(Condition::new(
                "amount",
                ConditionOperator::GreaterThan,
                Value::Number(10_000.0),
            ))
            .with_condition(Condition::new(
                "paymentMethod",
                ConditionOperator::Equals,
                Value::String("DIGITAL_WALLET".to_string()),
            ))
            .with_action(RuleAction::ScoreAdjustment { adjustment: 15 });

        assert!(rule.active);
        assert_eq!(rule.priority, 8);
        assert_eq!(rule.conditions.len(), 2);
        assert_eq!(rule.actions.len(), 1);
        assert_eq!(rule.execution_count, 0);
    }

    #[test]
    fn test_rule_yaml_document() {
        let yaml = r#"
name: embargoed_country
priority: 9
conditions:
  - field: location.country
    operator: in
    value: ["KP", "IR"]
actions:
  - type: block
  - type: flag
    reason: embargoed destination
    severity: CRITICAL
"#;
        let rule: Rule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.name, "embargoed_country");
        assert!(rule.active);
        assert_eq!(rule.conditions[0].operator, ConditionOperator::In);
        assert_eq!(rule.actions[0], RuleAction::Block);
        assert!(matches!(
            &rule.actions[1],
            RuleAction::Flag { severity: Some(Severity::Critical), .. }
        ));
    }
}
