//! Thompson sampling selector over the two detection models.
//!
//! Policy:
//!   - Draw one sample per model from its current Beta posterior,
//!     always in ModelId order (A, then B).
//!   - Pick the larger sample.
//!   - Exact tie: Model A.

use crate::{
    error::SimResult,
    posterior::PosteriorStore,
    rng::SimRng,
    types::ModelId,
};
use serde::{Deserialize, Serialize};

/// The selector's choice plus the samples that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub model:   ModelId,
    pub samples: [f64; ModelId::COUNT],
}

pub struct ThompsonSelector {
    rng:              SimRng,
    selection_counts: [u64; ModelId::COUNT],
}

impl ThompsonSelector {
    pub fn new(rng: SimRng) -> Self {
        Self { rng, selection_counts: [0; ModelId::COUNT] }
    }

    /// Sample both posteriors and pick the arg-max. Increments the chosen
    /// model's selection count; knows nothing about ground truth.
    pub fn select(&mut self, posteriors: &PosteriorStore) -> SimResult<Selection> {
        let mut samples = [0.0; ModelId::COUNT];
        for model in ModelId::ALL {
            samples[model.index()] = posteriors.sample(model, &mut self.rng)?;
        }

        let model = if samples[ModelId::B.index()] > samples[ModelId::A.index()] {
            ModelId::B
        } else {
            ModelId::A
        };
        self.selection_counts[model.index()] += 1;

        Ok(Selection { model, samples })
    }

    pub fn selection_count(&self, model: ModelId) -> u64 {
        self.selection_counts[model.index()]
    }

    pub fn selection_counts(&self) -> [u64; ModelId::COUNT] {
        self.selection_counts
    }

    pub fn total_selections(&self) -> u64 {
        self.selection_counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::BetaPosterior;

    #[test]
    fn counts_sum_to_number_of_selections() {
        let mut selector = ThompsonSelector::new(SimRng::new(9, 1));
        let store = PosteriorStore::new();
        for _ in 0..250 {
            selector.select(&store).unwrap();
        }
        assert_eq!(selector.total_selections(), 250);
        assert_eq!(
            selector.selection_count(ModelId::A) + selector.selection_count(ModelId::B),
            250
        );
    }

    #[test]
    fn chosen_model_holds_the_larger_sample() {
        let mut selector = ThompsonSelector::new(SimRng::new(10, 1));
        let store = PosteriorStore::new();
        for _ in 0..200 {
            let s = selector.select(&store).unwrap();
            let other = match s.model {
                ModelId::A => ModelId::B,
                ModelId::B => ModelId::A,
            };
            assert!(s.samples[s.model.index()] >= s.samples[other.index()]);
        }
    }

    #[test]
    fn confident_posterior_dominates() {
        let mut selector = ThompsonSelector::new(SimRng::new(11, 1));
        let mut store = PosteriorStore::new();
        store.set(ModelId::B, BetaPosterior::new(500.0, 5.0).unwrap()).unwrap();
        store.set(ModelId::A, BetaPosterior::new(5.0, 500.0).unwrap()).unwrap();
        for _ in 0..100 {
            assert_eq!(selector.select(&store).unwrap().model, ModelId::B);
        }
    }

    #[test]
    fn same_seed_same_choices() {
        let store = PosteriorStore::new();
        let mut s1 = ThompsonSelector::new(SimRng::new(42, 1));
        let mut s2 = ThompsonSelector::new(SimRng::new(42, 1));
        for _ in 0..100 {
            assert_eq!(s1.select(&store).unwrap(), s2.select(&store).unwrap());
        }
    }
}
