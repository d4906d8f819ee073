//! Simulation parameters and their validation.
//!
//! RULE: A SimConfig reaching the engine has passed validate().
//! Out-of-range values are rejected before any iteration runs.

use crate::error::{SimError, SimResult};
use crate::types::{Iteration, ModelId};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// True recall of Model A, in [0, 1].
    pub recall_a: f64,
    /// True recall of Model B, in [0, 1].
    pub recall_b: f64,
    /// Iterations between a selection and its outcome becoming visible.
    pub feedback_delay: Iteration,
    /// Probability that a synthetic transaction is fraudulent, in [0, 1].
    pub fraud_rate: f64,
    /// Multiplicative forgetting applied before each update, in (0, 1].
    pub decay_rate: f64,
    /// Master seed. None draws one from the OS at configure time.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            recall_a:       0.8,
            recall_b:       0.6,
            feedback_delay: 10,
            fraud_rate:     0.05,
            decay_rate:     1.0,
            seed:           None,
        }
    }
}

impl SimConfig {
    pub fn new(
        recall_a: f64,
        recall_b: f64,
        feedback_delay: Iteration,
        fraud_rate: f64,
        decay_rate: f64,
        seed: Option<u64>,
    ) -> Self {
        Self { recall_a, recall_b, feedback_delay, fraud_rate, decay_rate, seed }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    /// The result is validated before it is returned.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        check_unit_interval("recall_a", self.recall_a)?;
        check_unit_interval("recall_b", self.recall_b)?;
        check_unit_interval("fraud_rate", self.fraud_rate)?;
        if !(self.decay_rate.is_finite() && self.decay_rate > 0.0 && self.decay_rate <= 1.0) {
            return Err(SimError::invalid(
                "decay_rate",
                format!("must be in (0, 1], got {}", self.decay_rate),
            ));
        }
        // feedback_delay is unsigned; any value is a valid delay.
        Ok(())
    }

    pub fn recall(&self, model: ModelId) -> f64 {
        match model {
            ModelId::A => self.recall_a,
            ModelId::B => self.recall_b,
        }
    }
}

/// Partial parameter change. Omitted fields keep their current value;
/// the seed is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    pub recall_a:       Option<f64>,
    pub recall_b:       Option<f64>,
    pub feedback_delay: Option<Iteration>,
    pub fraud_rate:     Option<f64>,
    pub decay_rate:     Option<f64>,
}

impl ConfigPatch {
    /// `current` with every present field replaced. Not validated.
    pub fn merged_over(&self, current: &SimConfig) -> SimConfig {
        SimConfig {
            recall_a:       self.recall_a.unwrap_or(current.recall_a),
            recall_b:       self.recall_b.unwrap_or(current.recall_b),
            feedback_delay: self.feedback_delay.unwrap_or(current.feedback_delay),
            fraud_rate:     self.fraud_rate.unwrap_or(current.fraud_rate),
            decay_rate:     self.decay_rate.unwrap_or(current.decay_rate),
            seed:           current.seed,
        }
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid(field, format!("must be in [0, 1], got {value}")))
    }
}
