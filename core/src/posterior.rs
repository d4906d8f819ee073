//! Beta posterior store — per-model belief over true recall.
//!
//! Each update is decay-then-increment:
//!   alpha, beta *= decay_rate   (always, before looking at the outcome)
//!   alpha += 1 on a true positive, beta += 1 on a false negative
//!
//! Every update returns a PriorUpdateRecord for the append-only audit log.

use crate::{
    error::{SimError, SimResult},
    rng::SimRng,
    types::{DetectionOutcome, Iteration, ModelId},
};
use serde::{Deserialize, Serialize};

/// Uninformative prior for both shape parameters.
pub const PRIOR_SHAPE: f64 = 1.0;

/// Lower bound on the shape parameters handed to the Beta sampler.
/// Stored parameters are never clamped to it.
pub const SAMPLE_SHAPE_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta:  f64,
}

impl Default for BetaPosterior {
    fn default() -> Self {
        Self { alpha: PRIOR_SHAPE, beta: PRIOR_SHAPE }
    }
}

impl BetaPosterior {
    pub fn new(alpha: f64, beta: f64) -> SimResult<Self> {
        let posterior = Self { alpha, beta };
        posterior.check()?;
        Ok(posterior)
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// One draw from Beta(alpha, beta). Leaves the posterior untouched.
    /// Shapes below SAMPLE_SHAPE_FLOOR are raised to it for the draw only.
    pub fn sample(&self, rng: &mut SimRng) -> SimResult<f64> {
        rng.beta(
            self.alpha.max(SAMPLE_SHAPE_FLOOR),
            self.beta.max(SAMPLE_SHAPE_FLOOR),
        )
    }

    /// Exact multiplicative decay. Only an underflow to zero is caught,
    /// by holding the parameter at the smallest positive normal f64.
    fn decay(&mut self, decay_rate: f64) {
        self.alpha = (self.alpha * decay_rate).max(f64::MIN_POSITIVE);
        self.beta = (self.beta * decay_rate).max(f64::MIN_POSITIVE);
    }

    fn check(&self) -> SimResult<()> {
        let ok = |x: f64| x.is_finite() && x > 0.0;
        if ok(self.alpha) && ok(self.beta) {
            Ok(())
        } else {
            Err(SimError::invariant(format!(
                "posterior shape must be positive and finite, got alpha={} beta={}",
                self.alpha, self.beta
            )))
        }
    }
}

/// Immutable snapshot of one posterior update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorUpdateRecord {
    /// Iteration at which the feedback was applied.
    pub iteration:   Iteration,
    /// Iteration at which the model was selected.
    pub selected_at: Iteration,
    pub model:       ModelId,
    pub outcome:     DetectionOutcome,
    pub old_alpha:   f64,
    pub old_beta:    f64,
    pub new_alpha:   f64,
    pub new_beta:    f64,
}

/// Fixed two-slot posterior table indexed by ModelId.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosteriorStore {
    posteriors: [BetaPosterior; ModelId::COUNT],
}

impl PosteriorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model: ModelId) -> BetaPosterior {
        self.posteriors[model.index()]
    }

    /// Overwrite a model's parameters. Rejects non-positive shapes.
    pub fn set(&mut self, model: ModelId, posterior: BetaPosterior) -> SimResult<()> {
        posterior.check()?;
        self.posteriors[model.index()] = posterior;
        Ok(())
    }

    pub fn sample(&self, model: ModelId, rng: &mut SimRng) -> SimResult<f64> {
        self.get(model).sample(rng)
    }

    /// Apply decay, then count the outcome. `iteration` and `selected_at`
    /// are carried into the returned log record only.
    pub fn decay_and_update(
        &mut self,
        model: ModelId,
        decay_rate: f64,
        outcome: DetectionOutcome,
        iteration: Iteration,
        selected_at: Iteration,
    ) -> SimResult<PriorUpdateRecord> {
        if !(decay_rate > 0.0 && decay_rate <= 1.0) {
            return Err(SimError::invariant(format!(
                "decay_rate {decay_rate} outside (0, 1] reached the posterior store"
            )));
        }

        let slot = &mut self.posteriors[model.index()];
        slot.check()?;
        let old = *slot;

        slot.decay(decay_rate);
        if outcome.is_success() {
            slot.alpha += 1.0;
        } else {
            slot.beta += 1.0;
        }
        slot.check()?;

        Ok(PriorUpdateRecord {
            iteration,
            selected_at,
            model,
            outcome,
            old_alpha: old.alpha,
            old_beta:  old.beta,
            new_alpha: slot.alpha,
            new_beta:  slot.beta,
        })
    }

    pub fn reset(&mut self) {
        self.posteriors = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn starts_uninformative() {
        let store = PosteriorStore::new();
        for model in ModelId::ALL {
            assert_eq!(store.get(model), BetaPosterior { alpha: 1.0, beta: 1.0 });
        }
    }

    #[test]
    fn decay_applies_before_increment_on_success() {
        let mut store = PosteriorStore::new();
        store.set(ModelId::A, BetaPosterior::new(3.0, 2.0).unwrap()).unwrap();

        let rec = store
            .decay_and_update(ModelId::A, 0.9, DetectionOutcome::TruePositive, 5, 5)
            .unwrap();

        let p = store.get(ModelId::A);
        assert!((p.alpha - 3.7).abs() < EPS, "alpha = {}", p.alpha);
        assert!((p.beta - 1.8).abs() < EPS, "beta = {}", p.beta);
        assert_eq!(rec.old_alpha, 3.0);
        assert_eq!(rec.old_beta, 2.0);
        assert_eq!(rec.new_alpha, p.alpha);
        assert_eq!(rec.new_beta, p.beta);
    }

    #[test]
    fn decay_applies_before_increment_on_failure() {
        let mut store = PosteriorStore::new();
        store.set(ModelId::B, BetaPosterior::new(3.0, 2.0).unwrap()).unwrap();

        store
            .decay_and_update(ModelId::B, 0.5, DetectionOutcome::FalseNegative, 1, 1)
            .unwrap();

        let p = store.get(ModelId::B);
        assert!((p.alpha - 1.5).abs() < EPS);
        assert!((p.beta - 2.0).abs() < EPS);
    }

    #[test]
    fn no_decay_is_plain_counting() {
        let mut store = PosteriorStore::new();
        for _ in 0..4 {
            store.decay_and_update(ModelId::A, 1.0, DetectionOutcome::TruePositive, 1, 1).unwrap();
        }
        store.decay_and_update(ModelId::A, 1.0, DetectionOutcome::FalseNegative, 1, 1).unwrap();
        assert_eq!(store.get(ModelId::A), BetaPosterior { alpha: 5.0, beta: 2.0 });
        assert_eq!(store.get(ModelId::B), BetaPosterior::default());
    }

    #[test]
    fn record_carries_iterations_and_outcome() {
        let mut store = PosteriorStore::new();
        let rec = store
            .decay_and_update(ModelId::B, 1.0, DetectionOutcome::FalseNegative, 12, 7)
            .unwrap();
        assert_eq!(rec.iteration, 12);
        assert_eq!(rec.selected_at, 7);
        assert_eq!(rec.model, ModelId::B);
        assert_eq!(rec.outcome, DetectionOutcome::FalseNegative);
    }

    #[test]
    fn out_of_range_decay_is_invariant_violation() {
        let mut store = PosteriorStore::new();
        let err = store
            .decay_and_update(ModelId::A, 0.0, DetectionOutcome::TruePositive, 1, 1)
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.get(ModelId::A), BetaPosterior::default());
    }

    #[test]
    fn set_rejects_non_positive_shape() {
        let mut store = PosteriorStore::new();
        assert!(store.set(ModelId::A, BetaPosterior { alpha: 0.0, beta: 1.0 }).is_err());
        assert!(store.set(ModelId::A, BetaPosterior { alpha: 1.0, beta: f64::NAN }).is_err());
    }

    #[test]
    fn one_sided_streak_decays_the_other_shape_exactly() {
        let mut store = PosteriorStore::new();
        for i in 0..10 {
            store.decay_and_update(ModelId::A, 0.5, DetectionOutcome::TruePositive, i, i).unwrap();
        }
        let p = store.get(ModelId::A);
        assert_eq!(p.beta, 0.5f64.powi(10));
        assert!((p.alpha - (2.0 - 0.5f64.powi(10))).abs() < EPS, "alpha = {}", p.alpha);
    }

    #[test]
    fn long_streak_under_strong_decay_stays_positive_and_sampleable() {
        let mut store = PosteriorStore::new();
        for i in 0..10_000 {
            store.decay_and_update(ModelId::B, 0.05, DetectionOutcome::FalseNegative, i, i).unwrap();
        }
        let p = store.get(ModelId::B);
        assert!(p.alpha > 0.0);
        assert!(p.alpha < 1e-300, "alpha = {}", p.alpha);
        assert!(p.beta > 1.0);

        let mut rng = SimRng::new(6, 1);
        for _ in 0..200 {
            let x = store.sample(ModelId::B, &mut rng).unwrap();
            assert!((0.0..=1.0).contains(&x), "sample {x} out of range");
        }
        assert_eq!(store.get(ModelId::B), p);
    }

    #[test]
    fn sampling_does_not_mutate() {
        let store = PosteriorStore::new();
        let mut rng = SimRng::new(5, 1);
        for _ in 0..100 {
            store.sample(ModelId::A, &mut rng).unwrap();
        }
        assert_eq!(store, PosteriorStore::new());
    }

    #[test]
    fn reset_restores_priors() {
        let mut store = PosteriorStore::new();
        store.decay_and_update(ModelId::A, 0.9, DetectionOutcome::TruePositive, 1, 1).unwrap();
        store.reset();
        assert_eq!(store, PosteriorStore::new());
    }

    proptest! {
        #[test]
        fn shapes_stay_positive_under_any_decay(
            decay in 1e-6f64..=1.0,
            outcomes in proptest::collection::vec(any::<bool>(), 1..400),
        ) {
            let mut store = PosteriorStore::new();
            for (i, success) in outcomes.into_iter().enumerate() {
                let model = if i % 3 == 0 { ModelId::B } else { ModelId::A };
                let rec = store
                    .decay_and_update(
                        model,
                        decay,
                        DetectionOutcome::from_detected(success),
                        i as u64,
                        i as u64,
                    )
                    .unwrap();
                prop_assert!(rec.new_alpha > 0.0 && rec.new_beta > 0.0);
                for m in ModelId::ALL {
                    let p = store.get(m);
                    prop_assert!(p.alpha > 0.0 && p.alpha.is_finite());
                    prop_assert!(p.beta > 0.0 && p.beta.is_finite());
                }
            }
        }
    }
}
