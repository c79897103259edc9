//! Status classification from the final risk score
//!
//! Applies only at first creation: a caller-supplied status is honored
//! unless it is the SAFE placeholder, and a status forced by a rule action
//! is never revisited (rules only force SUSPICIOUS or FRAUD, which this
//! resolver passes through untouched).

use fraudwatch_core::TransactionStatus;

/// Score at or above which a transaction is classified FRAUD
pub const FRAUD_THRESHOLD: u8 = 80;
/// Score at or above which a transaction is classified SUSPICIOUS
pub const SUSPICIOUS_THRESHOLD: u8 = 50;

/// Derive a status from the final score
pub fn derive_status(score: u8) -> TransactionStatus {
    if score >= FRAUD_THRESHOLD {
        TransactionStatus::Fraud
    } else if score >= SUSPICIOUS_THRESHOLD {
        TransactionStatus::Suspicious
    } else {
        TransactionStatus::Safe
    }
}

/// Resolve the status to persist at creation time
///
/// `None` and the SAFE default both mean "derive from the score"; any other
/// supplied status (caller-set or rule-forced) wins.
pub fn resolve_status(supplied: Option<TransactionStatus>, score: u8) -> TransactionStatus {
    match supplied {
        Some(TransactionStatus::Safe) | None => derive_status(score),
        Some(status) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_thresholds() {
        assert_eq!(derive_status(0), TransactionStatus::Safe);
        assert_eq!(derive_status(49), TransactionStatus::Safe);
        assert_eq!(derive_status(50), TransactionStatus::Suspicious);
        assert_eq!(derive_status(79), TransactionStatus::Suspicious);
        assert_eq!(derive_status(80), TransactionStatus::Fraud);
        assert_eq!(derive_status(100), TransactionStatus::Fraud);
    }

    #[test]
    fn test_resolve_derives_on_placeholder() {
        assert_eq!(resolve_status(None, 85), TransactionStatus::Fraud);
        assert_eq!(
            resolve_status(Some(TransactionStatus::Safe), 60),
            TransactionStatus::Suspicious
        );
    }

    #[test]
    fn test_resolve_honors_explicit_status() {
        // A forced or caller-set SUSPICIOUS is kept even with a fraud-level score
        assert_eq!(
            resolve_status(Some(TransactionStatus::Suspicious), 95),
            TransactionStatus::Suspicious
        );
        assert_eq!(
            resolve_status(Some(TransactionStatus::Fraud), 0),
            TransactionStatus::Fraud
        );
    }
}
