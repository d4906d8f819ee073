//! Delayed-feedback Thompson Sampling simulator for choosing between
//! two fraud-detection models.
//!
//! Start with [`engine::SimEngine::configure`], then call `run` and
//! `reset` on the returned handle.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod feedback;
pub mod metrics;
pub mod outcome;
pub mod posterior;
pub mod rng;
pub mod selector;
pub mod snapshot;
pub mod types;

pub use config::{ConfigPatch, SimConfig};
pub use engine::{SimEngine, SimulationHandle};
pub use error::{SimError, SimResult};
pub use types::{DetectionOutcome, Iteration, ModelId};
