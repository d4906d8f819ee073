//! Events emitted by each simulation step.
//!
//! Every step returns its events in emission order. The stream is the
//! replay record: two engines with the same seed and config must emit
//! byte-identical serialized streams.

use crate::types::{DetectionOutcome, Iteration, ModelId};
use serde::{Deserialize, Serialize};

/// Variants may be added — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    IterationStarted {
        iteration: Iteration,
    },
    IterationCompleted {
        iteration: Iteration,
        overall_recall: Option<f64>,
    },
    RunInitialized {
        seed: u64,
    },

    // ── Step events ────────────────────────────────
    TransactionGenerated {
        iteration: Iteration,
        is_fraud: bool,
    },
    ModelSelected {
        iteration: Iteration,
        model: ModelId,
        sample_a: f64,
        sample_b: f64,
    },
    FeedbackEnqueued {
        iteration: Iteration,
        model: ModelId,
        detected: bool,
        due_iteration: Iteration,
    },
    PriorUpdated {
        iteration: Iteration,
        model: ModelId,
        outcome: DetectionOutcome,
        new_alpha: f64,
        new_beta: f64,
    },
}

impl SimEvent {
    /// Stable string name for the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::IterationStarted { .. }     => "iteration_started",
            SimEvent::IterationCompleted { .. }   => "iteration_completed",
            SimEvent::RunInitialized { .. }       => "run_initialized",
            SimEvent::TransactionGenerated { .. } => "transaction_generated",
            SimEvent::ModelSelected { .. }        => "model_selected",
            SimEvent::FeedbackEnqueued { .. }     => "feedback_enqueued",
            SimEvent::PriorUpdated { .. }         => "prior_updated",
        }
    }
}
