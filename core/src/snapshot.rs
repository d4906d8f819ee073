//! Run summary — the state handed back to a caller after each run.
//!
//! Carries everything a display layer needs: posteriors, selection
//! counts, TP/FN counts, recall, last selection, and the recent tail
//! of the prior update log.

use crate::{
    clock::RunState,
    metrics::DetectionCounts,
    posterior::PriorUpdateRecord,
    types::{Iteration, ModelId},
};
use serde::{Deserialize, Serialize};

/// How many update log records a summary carries.
pub const UPDATE_LOG_TAIL: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model:           ModelId,
    pub true_recall:     f64,
    pub alpha:           f64,
    pub beta:            f64,
    pub posterior_mean:  f64,
    pub selection_count: u64,
    pub counts:          DetectionCounts,
    pub observed_recall: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed:             u64,
    pub iteration:        Iteration,
    pub state:            RunState,
    pub models:           [ModelSummary; ModelId::COUNT],
    pub overall:          DetectionCounts,
    pub overall_recall:   Option<f64>,
    pub last_selected:    Option<ModelId>,
    pub pending_feedback: usize,
    pub recent_updates:   Vec<PriorUpdateRecord>,
}

impl RunSummary {
    pub fn model(&self, model: ModelId) -> &ModelSummary {
        &self.models[model.index()]
    }
}
