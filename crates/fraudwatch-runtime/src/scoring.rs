//! Risk scoring heuristic
//!
//! A pure additive heuristic over transaction attributes: amount bands,
//! payment-method weights, a late-night window penalty and a high-risk
//! country penalty, clamped to [0, 100]. Deterministic for identical input;
//! the scorer is bypassed when the caller supplies an explicit score.

use chrono::Timelike;
use fraudwatch_core::{PaymentMethod, Transaction, TransactionDraft};
use serde::{Deserialize, Serialize};

/// One amount band: amounts strictly above `min` contribute `weight`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountBand {
    pub min: f64,
    pub weight: u8,
}

/// Additive weights per payment method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct MethodWeights {
    pub credit_card: u8,
    pub debit_card: u8,
    pub bank_transfer: u8,
    pub digital_wallet: u8,
    pub other: u8,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            credit_card: 5,
            debit_card: 5,
            bank_transfer: 10,
            digital_wallet: 15,
            other: 20,
        }
    }
}

impl MethodWeights {
    /// Weight contributed by a payment method
    pub fn weight(&self, method: PaymentMethod) -> u8 {
        match method {
            PaymentMethod::CreditCard => self.credit_card,
            PaymentMethod::DebitCard => self.debit_card,
            PaymentMethod::BankTransfer => self.bank_transfer,
            PaymentMethod::DigitalWallet => self.digital_wallet,
            PaymentMethod::Other => self.other,
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Amount bands, checked highest first; the first match contributes
    pub amount_bands: Vec<AmountBand>,
    pub method_weights: MethodWeights,
    /// Countries that add `country_weight` to the score
    pub high_risk_countries: Vec<String>,
    pub country_weight: u8,
    /// Late-night window `[start_hour, end_hour)` in UTC
    pub late_night_start: u32,
    pub late_night_end: u32,
    pub late_night_weight: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            amount_bands: vec![
                AmountBand { min: 100_000.0, weight: 40 },
                AmountBand { min: 50_000.0, weight: 30 },
                AmountBand { min: 10_000.0, weight: 20 },
                AmountBand { min: 5_000.0, weight: 10 },
            ],
            method_weights: MethodWeights::default(),
            high_risk_countries: Vec::new(),
            country_weight: 25,
            late_night_start: 0,
            late_night_end: 6,
            late_night_weight: 15,
        }
    }
}

/// Risk scorer
///
/// No side effects and no I/O; safe to run fully in parallel across
/// unrelated transactions.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a draft transaction into [0, 100]
    pub fn score(&self, draft: &TransactionDraft) -> u8 {
        let mut score: i64 = 0;

        score += self.amount_weight(draft.amount) as i64;
        score += self.config.method_weights.weight(draft.payment_method) as i64;

        if let Some(country) = &draft.location.country {
            if self
                .config
                .high_risk_countries
                .iter()
                .any(|c| c.eq_ignore_ascii_case(country))
            {
                score += self.config.country_weight as i64;
            }
        }

        if let Some(timestamp) = draft.timestamp {
            if self.in_late_night_window(timestamp.hour()) {
                score += self.config.late_night_weight as i64;
            }
        }

        Transaction::clamp_score(score)
    }

    fn amount_weight(&self, amount: f64) -> u8 {
        let mut bands = self.config.amount_bands.clone();
        bands.sort_by(|a, b| b.min.partial_cmp(&a.min).unwrap_or(std::cmp::Ordering::Equal));
        bands
            .iter()
            .find(|band| amount > band.min)
            .map(|band| band.weight)
            .unwrap_or(0)
    }

    fn in_late_night_window(&self, hour: u32) -> bool {
        let (start, end) = (self.config.late_night_start, self.config.late_night_end);
        if start <= end {
            hour >= start && hour < end
        } else {
            // Window wraps around midnight
            hour >= start || hour < end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fraudwatch_core::Location;

    fn draft_at_noon(amount: f64, method: PaymentMethod) -> TransactionDraft {
        let mut draft =
            TransactionDraft::new("user-1", amount).with_payment_method(method);
        draft.timestamp = Some(Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap());
        draft
    }

    #[test]
    fn test_amount_bands() {
        let scorer = RiskScorer::default();
        // Card weight is 5 at noon, so band contributions are score - 5
        assert_eq!(
            scorer.score(&draft_at_noon(1_000.0, PaymentMethod::CreditCard)),
            5
        );
        assert_eq!(
            scorer.score(&draft_at_noon(6_000.0, PaymentMethod::CreditCard)),
            15
        );
        assert_eq!(
            scorer.score(&draft_at_noon(20_000.0, PaymentMethod::CreditCard)),
            25
        );
        assert_eq!(
            scorer.score(&draft_at_noon(60_000.0, PaymentMethod::CreditCard)),
            35
        );
        assert_eq!(
            scorer.score(&draft_at_noon(200_000.0, PaymentMethod::CreditCard)),
            45
        );
    }

    #[test]
    fn test_method_weights() {
        let scorer = RiskScorer::default();
        assert_eq!(
            scorer.score(&draft_at_noon(100.0, PaymentMethod::DigitalWallet)),
            15
        );
        assert_eq!(
            scorer.score(&draft_at_noon(100.0, PaymentMethod::BankTransfer)),
            10
        );
        assert_eq!(scorer.score(&draft_at_noon(100.0, PaymentMethod::Other)), 20);
    }

    #[test]
    fn test_late_night_penalty() {
        let scorer = RiskScorer::default();
        let mut draft = draft_at_noon(100.0, PaymentMethod::CreditCard);
        draft.timestamp = Some(Utc.with_ymd_and_hms(2024, 5, 14, 3, 0, 0).unwrap());
        assert_eq!(scorer.score(&draft), 20); // 5 (card) + 15 (late night)
    }

    #[test]
    fn test_high_risk_country_penalty() {
        let scorer = RiskScorer::new(ScoringConfig {
            high_risk_countries: vec!["KP".to_string()],
            ..Default::default()
        });
        let mut draft = draft_at_noon(100.0, PaymentMethod::CreditCard);
        draft.location = Location {
            country: Some("kp".to_string()),
            ..Default::default()
        };
        assert_eq!(scorer.score(&draft), 30); // 5 (card) + 25 (country)
    }

    #[test]
    fn test_wrapping_late_night_window() {
        let scorer = RiskScorer::new(ScoringConfig {
            late_night_start: 22,
            late_night_end: 5,
            ..Default::default()
        });
        let mut draft = draft_at_noon(100.0, PaymentMethod::CreditCard);
        draft.timestamp = Some(Utc.with_ymd_and_hms(2024, 5, 14, 23, 0, 0).unwrap());
        assert_eq!(scorer.score(&draft), 20);

        draft.timestamp = Some(Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap());
        assert_eq!(scorer.score(&draft), 5);
    }

    #[test]
    fn test_score_always_in_range_and_deterministic() {
        let scorer = RiskScorer::new(ScoringConfig {
            high_risk_countries: vec!["KP".to_string(), "IR".to_string()],
            ..Default::default()
        });

        let amounts = [0.0, 4_999.0, 5_001.0, 60_000.0, 150_000.0, 1e12];
        let methods = [
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::DigitalWallet,
            PaymentMethod::Other,
        ];
        let countries = [None, Some("US"), Some("KP")];

        for amount in amounts {
            for method in methods {
                for country in countries {
                    for hour in 0..24 {
                        let mut draft = TransactionDraft::new("u", amount)
                            .with_payment_method(method);
                        draft.timestamp =
                            Some(Utc.with_ymd_and_hms(2024, 5, 14, hour, 30, 0).unwrap());
                        draft.location = Location {
                            country: country.map(String::from),
                            ..Default::default()
                        };

                        let first = scorer.score(&draft);
                        assert!(first <= 100);
                        assert_eq!(first, scorer.score(&draft), "scoring must be deterministic");
                    }
                }
            }
        }
    }
}
