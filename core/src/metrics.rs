//! Detection metrics: TP/FN counts per model and overall, recall,
//! and the history series the runner reports.

use crate::types::{DetectionOutcome, Iteration, ModelId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionCounts {
    pub true_positives:  u64,
    pub false_negatives: u64,
}

impl DetectionCounts {
    pub fn record(&mut self, outcome: DetectionOutcome) {
        match outcome {
            DetectionOutcome::TruePositive  => self.true_positives += 1,
            DetectionOutcome::FalseNegative => self.false_negatives += 1,
        }
    }

    pub fn observed(&self) -> u64 {
        self.true_positives + self.false_negatives
    }

    /// tp / (tp + fn); None when no fraud has been observed yet.
    pub fn recall(&self) -> Option<f64> {
        match self.observed() {
            0 => None,
            n => Some(self.true_positives as f64 / n as f64),
        }
    }
}

/// Running recall after one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecallPoint {
    pub iteration: Iteration,
    pub recall:    Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsAggregator {
    per_model:      [DetectionCounts; ModelId::COUNT],
    overall:        DetectionCounts,
    /// Cumulative overall counts after each applied feedback entry.
    history:        Vec<DetectionCounts>,
    recall_history: Vec<RecallPoint>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_feedback(&mut self, model: ModelId, outcome: DetectionOutcome) {
        self.per_model[model.index()].record(outcome);
        self.overall.record(outcome);
        self.history.push(self.overall);
    }

    pub fn record_iteration(&mut self, iteration: Iteration) {
        self.recall_history.push(RecallPoint { iteration, recall: self.overall.recall() });
    }

    pub fn overall(&self) -> DetectionCounts {
        self.overall
    }

    pub fn for_model(&self, model: ModelId) -> DetectionCounts {
        self.per_model[model.index()]
    }

    pub fn overall_recall(&self) -> Option<f64> {
        self.overall.recall()
    }

    pub fn history(&self) -> &[DetectionCounts] {
        &self.history
    }

    pub fn recall_history(&self) -> &[RecallPoint] {
        &self.recall_history
    }

    /// Per-model counts must add up to the overall counts.
    pub fn is_consistent(&self) -> bool {
        let tp: u64 = self.per_model.iter().map(|c| c.true_positives).sum();
        let fns: u64 = self.per_model.iter().map(|c| c.false_negatives).sum();
        tp == self.overall.true_positives && fns == self.overall.false_negatives
    }
}

/// "0.83" or "N/A".
pub fn format_recall(recall: Option<f64>) -> String {
    match recall {
        Some(r) => format!("{r:.2}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recall_undefined_without_fraud() {
        let metrics = MetricsAggregator::new();
        assert_eq!(metrics.overall_recall(), None);
        assert_eq!(format_recall(metrics.overall_recall()), "N/A");
    }

    #[test]
    fn recall_counts_per_model_and_overall() {
        let mut metrics = MetricsAggregator::new();
        metrics.record_feedback(ModelId::A, DetectionOutcome::TruePositive);
        metrics.record_feedback(ModelId::A, DetectionOutcome::TruePositive);
        metrics.record_feedback(ModelId::A, DetectionOutcome::FalseNegative);
        metrics.record_feedback(ModelId::B, DetectionOutcome::FalseNegative);

        assert_eq!(
            metrics.for_model(ModelId::A),
            DetectionCounts { true_positives: 2, false_negatives: 1 }
        );
        assert_eq!(metrics.for_model(ModelId::B).recall(), Some(0.0));
        assert_eq!(metrics.overall_recall(), Some(0.5));
        assert_eq!(format_recall(metrics.overall_recall()), "0.50");
        assert!(metrics.is_consistent());
    }

    #[test]
    fn history_is_cumulative_per_feedback() {
        let mut metrics = MetricsAggregator::new();
        metrics.record_feedback(ModelId::B, DetectionOutcome::TruePositive);
        metrics.record_feedback(ModelId::A, DetectionOutcome::FalseNegative);
        let tps: Vec<u64> = metrics.history().iter().map(|c| c.true_positives).collect();
        let fns: Vec<u64> = metrics.history().iter().map(|c| c.false_negatives).collect();
        assert_eq!(tps, vec![1, 1]);
        assert_eq!(fns, vec![0, 1]);
    }

    #[test]
    fn recall_history_records_undefined_then_value() {
        let mut metrics = MetricsAggregator::new();
        metrics.record_iteration(1);
        metrics.record_feedback(ModelId::A, DetectionOutcome::TruePositive);
        metrics.record_iteration(2);
        assert_eq!(
            metrics.recall_history(),
            &[
                RecallPoint { iteration: 1, recall: None },
                RecallPoint { iteration: 2, recall: Some(1.0) },
            ]
        );
    }
}
