//! Synthetic ground truth and detection outcomes.
//!
//! POLICY: models have perfect precision. A legitimate transaction
//! produces no detection event and never feeds a posterior; only fraud
//! transactions generate an outcome.

use crate::rng::SimRng;

/// Draws fraud labels and detection results from their own streams so
/// changing one never perturbs the other.
pub struct OutcomeGenerator {
    transactions: SimRng,
    detections:   SimRng,
}

impl OutcomeGenerator {
    pub fn new(transactions: SimRng, detections: SimRng) -> Self {
        Self { transactions, detections }
    }

    /// Independent Bernoulli(fraud_rate) draw, no memory across calls.
    pub fn generate_transaction(&mut self, fraud_rate: f64) -> bool {
        self.transactions.chance(fraud_rate)
    }

    /// Bernoulli(recall) for fraud; None for legitimate traffic.
    pub fn generate_outcome(&mut self, recall: f64, is_fraud: bool) -> Option<bool> {
        if !is_fraud {
            return None;
        }
        Some(self.detections.chance(recall))
    }
}
