//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation loop may call any platform RNG.
//! All randomness flows through SimRng streams derived from the
//! single master seed stored on the engine.
//!
//! Each component gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot_index * golden-ratio constant). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Each stream is fully reproducible in isolation.

use crate::error::{SimError, SimResult};
use rand::{RngCore, SeedableRng};
use rand_distr::{Beta, Distribution};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG stream for a single component.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Bernoulli trial: returns true with probability p.
    /// p = 0 never fires, p = 1 always fires.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// One draw from Beta(alpha, beta).
    ///
    /// Shape parameters that rand_distr rejects are a posterior defect,
    /// not a sampling hiccup, so they surface as an invariant violation.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> SimResult<f64> {
        let dist = Beta::new(alpha, beta).map_err(|e| {
            SimError::invariant(format!(
                "cannot sample Beta({alpha}, {beta}) on stream '{}': {e}",
                self.name
            ))
        })?;
        let x = dist.sample(&mut self.inner);
        if x.is_nan() {
            return Err(SimError::invariant(format!(
                "Beta({alpha}, {beta}) produced NaN on stream '{}'",
                self.name
            )));
        }
        Ok(x)
    }
}

/// Stream factory for a single run.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_stream(&self, slot: StreamSlot) -> SimRng {
        SimRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Transaction = 0,
    Selector = 1,
    Outcome = 2,
    // Add new streams here — append only.
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Selector => "selector",
            Self::Outcome => "outcome",
        }
    }
}

/// Draw a master seed from the OS. Only used when the caller supplied
/// none; the result is logged so the run can be replayed.
pub fn entropy_seed() -> u64 {
    rand::random::<u64>()
}
