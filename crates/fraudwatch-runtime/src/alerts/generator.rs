//! Alert generation from persisted transactions
//!
//! Runs strictly after the persistence commit. A transaction triggers at
//! most one alert; the severity tiers are checked most-severe first.

use fraudwatch_core::{Alert, Severity, Transaction};

/// Risk score strictly above which an alert is raised
pub const ALERT_RISK_THRESHOLD: u8 = 70;
/// Amount strictly above which an alert is raised
pub const ALERT_AMOUNT_THRESHOLD: f64 = 50_000.0;

/// Derives alerts from persisted transactions using severity thresholds
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertGenerator;

impl AlertGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the alert a transaction warrants, if any
    pub fn evaluate(&self, transaction: &Transaction) -> Option<Alert> {
        let score = transaction.risk_score;
        let amount = transaction.amount;

        if score <= ALERT_RISK_THRESHOLD && amount <= ALERT_AMOUNT_THRESHOLD {
            return None;
        }

        let (severity, message) = if score >= 90 || amount > 100_000.0 {
            (
                Severity::Critical,
                format!(
                    "CRITICAL: High-risk transaction detected (Risk: {}, Amount: ${})",
                    score, amount
                ),
            )
        } else if score >= 80 || amount > 75_000.0 {
            (
                Severity::High,
                format!(
                    "HIGH: Suspicious transaction detected (Risk: {}, Amount: ${})",
                    score, amount
                ),
            )
        } else {
            (
                Severity::Medium,
                format!(
                    "MEDIUM: Transaction requires review (Risk: {}, Amount: ${})",
                    score, amount
                ),
            )
        };

        Some(Alert::new(transaction, message, severity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudwatch_core::TransactionDraft;

    fn transaction(amount: f64, score: u8) -> Transaction {
        TransactionDraft::new("user-1", amount)
            .with_risk_score(score)
            .into_transaction("test")
    }

    #[test]
    fn test_no_alert_at_boundaries() {
        let generator = AlertGenerator::new();
        assert!(generator.evaluate(&transaction(50_000.0, 70)).is_none());
        assert!(generator.evaluate(&transaction(0.0, 0)).is_none());
    }

    #[test]
    fn test_medium_just_over_risk_threshold() {
        let alert = AlertGenerator::new()
            .evaluate(&transaction(1_000.0, 71))
            .unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert!(alert.message.starts_with("MEDIUM:"));
    }

    #[test]
    fn test_medium_amount_only_trigger() {
        let alert = AlertGenerator::new()
            .evaluate(&transaction(50_001.0, 0))
            .unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.transaction_risk_score, 0);
    }

    #[test]
    fn test_high_tier() {
        let generator = AlertGenerator::new();
        let by_score = generator.evaluate(&transaction(100.0, 80)).unwrap();
        assert_eq!(by_score.severity, Severity::High);

        let by_amount = generator.evaluate(&transaction(80_000.0, 0)).unwrap();
        assert_eq!(by_amount.severity, Severity::High);
    }

    #[test]
    fn test_critical_tier() {
        let generator = AlertGenerator::new();
        let by_score = generator.evaluate(&transaction(100.0, 90)).unwrap();
        assert_eq!(by_score.severity, Severity::Critical);
        assert!(by_score.message.starts_with("CRITICAL:"));

        let by_amount = generator.evaluate(&transaction(150_000.0, 10)).unwrap();
        assert_eq!(by_amount.severity, Severity::Critical);
    }

    #[test]
    fn test_alert_snapshots_transaction() {
        let txn = transaction(60_000.0, 0);
        let alert = AlertGenerator::new().evaluate(&txn).unwrap();
        assert_eq!(alert.transaction_id, txn.transaction_id);
        assert_eq!(alert.transaction_amount, 60_000.0);
        assert_eq!(alert.user_id, "user-1");
    }
}
