//! Condition operator evaluation

use fraudwatch_core::{ConditionOperator, Value};

/// Evaluate one operator against a field value and the condition value
///
/// Null on either side never matches: a missing field fails the condition
/// regardless of operator, including the negated ones.
pub(crate) fn evaluate_operator(field: &Value, op: ConditionOperator, expected: &Value) -> bool {
    if field.is_null() || expected.is_null() {
        tracing::debug!(?op, "null operand, condition fails");
        return false;
    }

    match op {
        ConditionOperator::Equals => field == expected,
        ConditionOperator::NotEquals => field != expected,

        ConditionOperator::GreaterThan
        | ConditionOperator::LessThan
        | ConditionOperator::GreaterEqual
        | ConditionOperator::LessEqual => match (field.as_number(), expected.as_number()) {
            (Some(l), Some(r)) => match op {
                ConditionOperator::GreaterThan => l > r,
                ConditionOperator::LessThan => l < r,
                ConditionOperator::GreaterEqual => l >= r,
                ConditionOperator::LessEqual => l <= r,
                _ => unreachable!(),
            },
            _ => false,
        },

        ConditionOperator::Contains | ConditionOperator::NotContains => {
            match (field.as_str(), expected.as_str()) {
                (Some(haystack), Some(needle)) => {
                    let found = haystack.to_lowercase().contains(&needle.to_lowercase());
                    if op == ConditionOperator::Contains {
                        found
                    } else {
                        !found
                    }
                }
                _ => false,
            }
        }

        ConditionOperator::In | ConditionOperator::NotIn => match expected {
            Value::Array(items) => {
                let found = items.iter().any(|item| item == field);
                if op == ConditionOperator::In {
                    found
                } else {
                    !found
                }
            }
            _ => false,
        },
    }
}
