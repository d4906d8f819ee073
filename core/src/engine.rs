//! The simulation engine — drives the bandit loop.
//!
//! EXECUTION ORDER per iteration (fixed, never reordered):
//!   1. Advance the iteration counter.
//!   2. Generate ground truth (is_fraud).
//!   3. Select a model from the current posteriors.
//!   4. If fraud: draw the detection outcome, enqueue it with
//!      due = iteration + feedback_delay.
//!   5. Release due feedback; decay-and-update each posterior, append
//!      the log record, count TP/FN.
//!   6. Record selection history and running recall.
//!
//! RULES:
//!   - All randomness flows through streams from the RngBank.
//!   - A step error that is fatal faults the engine until reset().

use crate::{
    clock::{RunState, SimClock},
    config::{ConfigPatch, SimConfig},
    error::{SimError, SimResult},
    event::SimEvent,
    feedback::{FeedbackEntry, FeedbackQueue},
    metrics::MetricsAggregator,
    outcome::OutcomeGenerator,
    posterior::{PosteriorStore, PriorUpdateRecord},
    rng::{entropy_seed, RngBank, StreamSlot},
    selector::ThompsonSelector,
    snapshot::{ModelSummary, RunSummary, UPDATE_LOG_TAIL},
    types::{DetectionOutcome, Iteration, ModelId},
};

/// Handle returned by configure(); owns every piece of run state.
pub type SimulationHandle = SimEngine;

pub struct SimEngine {
    pub clock:         SimClock,
    config:            SimConfig,
    rng_bank:          RngBank,
    posteriors:        PosteriorStore,
    selector:          ThompsonSelector,
    generator:         OutcomeGenerator,
    queue:             FeedbackQueue,
    metrics:           MetricsAggregator,
    selection_history: Vec<ModelId>,
    update_log:        Vec<PriorUpdateRecord>,
}

impl SimEngine {
    /// Validate the configuration and build an idle engine.
    /// A missing seed is drawn once here and reused by reset().
    pub fn configure(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = entropy_seed();
                log::info!("No seed configured; drew seed {seed}");
                seed
            }
        };
        let config = SimConfig { seed: Some(seed), ..config };
        let rng_bank = RngBank::new(seed);

        log::info!(
            "Configured simulation: recall_a={} recall_b={} delay={} fraud_rate={} decay={} seed={seed}",
            config.recall_a,
            config.recall_b,
            config.feedback_delay,
            config.fraud_rate,
            config.decay_rate,
        );

        Ok(Self {
            clock:             SimClock::new(),
            selector:          ThompsonSelector::new(rng_bank.for_stream(StreamSlot::Selector)),
            generator:         Self::build_generator(&rng_bank),
            posteriors:        PosteriorStore::new(),
            queue:             FeedbackQueue::new(),
            metrics:           MetricsAggregator::new(),
            selection_history: Vec::new(),
            update_log:        Vec::new(),
            rng_bank,
            config,
        })
    }

    fn build_generator(rng_bank: &RngBank) -> OutcomeGenerator {
        OutcomeGenerator::new(
            rng_bank.for_stream(StreamSlot::Transaction),
            rng_bank.for_stream(StreamSlot::Outcome),
        )
    }

    /// Run `n` more iterations and summarize the resulting state.
    pub fn run(&mut self, n: u64) -> SimResult<RunSummary> {
        self.run_steps(n, |_| {})?;
        Ok(self.summary())
    }

    /// Like run(), but returns every event the iterations emitted.
    pub fn run_with_events(&mut self, n: u64) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        self.run_steps(n, |event| events.push(event))?;
        Ok(events)
    }

    fn run_steps(&mut self, n: u64, mut emit: impl FnMut(SimEvent)) -> SimResult<()> {
        if self.clock.is_faulted() {
            return Err(SimError::RunFaulted);
        }

        if self.clock.current_iteration == 0 {
            emit(SimEvent::RunInitialized { seed: self.seed() });
        }

        self.clock.start();
        log::info!(
            "Running {n} iterations from iteration {}",
            self.clock.current_iteration
        );

        for _ in 0..n {
            if let Err(e) = self.step(&mut emit) {
                if e.is_fatal() {
                    log::error!(
                        "Iteration {} faulted the run: {e}",
                        self.clock.current_iteration
                    );
                    self.clock.fault();
                }
                return Err(e);
            }
        }

        self.clock.complete();
        log::info!(
            "Run completed at iteration {}; overall recall {:?}",
            self.clock.current_iteration,
            self.metrics.overall_recall()
        );
        Ok(())
    }

    /// Advance one iteration. This is the core simulation step.
    fn step(&mut self, emit: &mut impl FnMut(SimEvent)) -> SimResult<()> {
        let iteration = self.clock.advance();
        emit(SimEvent::IterationStarted { iteration });

        let is_fraud = self.generator.generate_transaction(self.config.fraud_rate);
        emit(SimEvent::TransactionGenerated { iteration, is_fraud });

        let selection = self.selector.select(&self.posteriors)?;
        let model = selection.model;
        log::debug!(
            "iteration={iteration} selected {model} (samples a={:.4} b={:.4}) fraud={is_fraud}",
            selection.samples[ModelId::A.index()],
            selection.samples[ModelId::B.index()],
        );
        emit(SimEvent::ModelSelected {
            iteration,
            model,
            sample_a: selection.samples[ModelId::A.index()],
            sample_b: selection.samples[ModelId::B.index()],
        });

        if let Some(detected) = self
            .generator
            .generate_outcome(self.config.recall(model), is_fraud)
        {
            let due_iteration = iteration.saturating_add(self.config.feedback_delay);
            self.queue.enqueue(FeedbackEntry {
                model,
                detected,
                selected_at: iteration,
                due_iteration,
            });
            emit(SimEvent::FeedbackEnqueued { iteration, model, detected, due_iteration });
        }

        for entry in self.queue.release(iteration) {
            let record = self.apply_feedback(iteration, entry)?;
            emit(SimEvent::PriorUpdated {
                iteration,
                model:     record.model,
                outcome:   record.outcome,
                new_alpha: record.new_alpha,
                new_beta:  record.new_beta,
            });
            self.update_log.push(record);
        }

        self.selection_history.push(model);
        self.metrics.record_iteration(iteration);
        self.check_invariants(iteration)?;

        emit(SimEvent::IterationCompleted {
            iteration,
            overall_recall: self.metrics.overall_recall(),
        });
        Ok(())
    }

    fn apply_feedback(
        &mut self,
        iteration: Iteration,
        entry: FeedbackEntry,
    ) -> SimResult<PriorUpdateRecord> {
        debug_assert!(entry.due_iteration <= iteration);
        let outcome = DetectionOutcome::from_detected(entry.detected);
        let record = self.posteriors.decay_and_update(
            entry.model,
            self.config.decay_rate,
            outcome,
            iteration,
            entry.selected_at,
        )?;
        self.metrics.record_feedback(entry.model, outcome);

        log::debug!(
            "iteration={iteration} {} {} (selected at {}): alpha {:.3}->{:.3} beta {:.3}->{:.3}",
            record.model,
            outcome.label(),
            record.selected_at,
            record.old_alpha,
            record.new_alpha,
            record.old_beta,
            record.new_beta,
        );
        Ok(record)
    }

    fn check_invariants(&self, iteration: Iteration) -> SimResult<()> {
        let selections = self.selector.total_selections();
        if selections != iteration || self.selection_history.len() as u64 != iteration {
            return Err(SimError::invariant(format!(
                "selection counts ({selections}) and history ({}) disagree with iteration {iteration}",
                self.selection_history.len()
            )));
        }
        if !self.metrics.is_consistent() {
            return Err(SimError::invariant(format!(
                "per-model detection counts disagree with overall counts at iteration {iteration}"
            )));
        }
        Ok(())
    }

    /// Return to initial priors, empty queue and log, zero counters.
    /// Streams are re-seeded from the same master seed.
    pub fn reset(&mut self) {
        log::info!("Resetting simulation (seed {})", self.seed());
        self.clock.reset();
        self.posteriors.reset();
        self.selector = ThompsonSelector::new(self.rng_bank.for_stream(StreamSlot::Selector));
        self.generator = Self::build_generator(&self.rng_bank);
        self.queue.clear();
        self.metrics = MetricsAggregator::new();
        self.selection_history.clear();
        self.update_log.clear();
    }

    /// Change recall rates, delay, fraud rate and decay mid-run. Learned
    /// state is kept; queued feedback keeps its original due iteration.
    /// The seed cannot be changed this way.
    pub fn update_parameters(&mut self, config: SimConfig) -> SimResult<()> {
        config.validate()?;
        if config.seed.is_some() && config.seed != self.config.seed {
            log::warn!("Ignoring seed change in parameter update; reconfigure to reseed");
        }
        if self.clock.current_iteration > 0 {
            log::warn!(
                "Parameters changed at iteration {}: recall_a={} recall_b={} delay={} fraud_rate={} decay={}",
                self.clock.current_iteration,
                config.recall_a,
                config.recall_b,
                config.feedback_delay,
                config.fraud_rate,
                config.decay_rate,
            );
        }
        self.config = SimConfig { seed: self.config.seed, ..config };
        Ok(())
    }

    /// Apply a partial parameter change over the current configuration.
    pub fn patch_parameters(&mut self, patch: &ConfigPatch) -> SimResult<()> {
        let merged = patch.merged_over(&self.config);
        self.update_parameters(merged)
    }

    pub fn summary(&self) -> RunSummary {
        let model_summary = |model: ModelId| {
            let posterior = self.posteriors.get(model);
            let counts = self.metrics.for_model(model);
            ModelSummary {
                model,
                true_recall:     self.config.recall(model),
                alpha:           posterior.alpha,
                beta:            posterior.beta,
                posterior_mean:  posterior.mean(),
                selection_count: self.selector.selection_count(model),
                counts,
                observed_recall: counts.recall(),
            }
        };

        let tail_start = self.update_log.len().saturating_sub(UPDATE_LOG_TAIL);
        RunSummary {
            seed:             self.seed(),
            iteration:        self.clock.current_iteration,
            state:            self.clock.state,
            models:           ModelId::ALL.map(model_summary),
            overall:          self.metrics.overall(),
            overall_recall:   self.metrics.overall_recall(),
            last_selected:    self.last_selected(),
            pending_feedback: self.queue.len(),
            recent_updates:   self.update_log[tail_start..].to_vec(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn state(&self) -> RunState {
        self.clock.state
    }

    pub fn posteriors(&self) -> &PosteriorStore {
        &self.posteriors
    }

    pub fn selection_count(&self, model: ModelId) -> u64 {
        self.selector.selection_count(model)
    }

    pub fn selection_history(&self) -> &[ModelId] {
        &self.selection_history
    }

    pub fn last_selected(&self) -> Option<ModelId> {
        self.selection_history.last().copied()
    }

    /// Full append-only update log.
    pub fn update_log(&self) -> &[PriorUpdateRecord] {
        &self.update_log
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    pub fn pending_feedback(&self) -> usize {
        self.queue.len()
    }
}
