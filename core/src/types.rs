//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulation iteration. One iteration = one synthetic transaction.
pub type Iteration = u64;

/// Identity of one of the two competing fraud-detection models.
///
/// The set is closed: per-model state lives in `[T; ModelId::COUNT]`
/// arrays indexed by `ModelId::index()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelId {
    A,
    B,
}

impl ModelId {
    pub const COUNT: usize = 2;
    pub const ALL: [ModelId; Self::COUNT] = [ModelId::A, ModelId::B];

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::A => "Model A",
            Self::B => "Model B",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single fraud transaction scored by the chosen model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionOutcome {
    /// Fraud caught.
    #[serde(rename = "TP")]
    TruePositive,
    /// Fraud missed.
    #[serde(rename = "FN")]
    FalseNegative,
}

impl DetectionOutcome {
    pub fn from_detected(detected: bool) -> Self {
        if detected {
            Self::TruePositive
        } else {
            Self::FalseNegative
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::TruePositive)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TruePositive  => "TP",
            Self::FalseNegative => "FN",
        }
    }
}
