use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    #[error("Invariant violation: {detail}")]
    InvariantViolation { detail: String },

    #[error("Run faulted by an earlier invariant violation; reset required")]
    RunFaulted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { field, reason: reason.into() }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InvariantViolation { detail: detail.into() }
    }

    /// True for errors that leave the engine unusable until reset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. } | Self::RunFaulted)
    }
}

pub type SimResult<T> = Result<T, SimError>;
