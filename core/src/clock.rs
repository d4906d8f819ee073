//! Simulation clock — owns the iteration counter and run state.

use crate::types::Iteration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    /// An invariant broke mid-run. Only reset() leaves this state.
    Faulted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current_iteration: Iteration,
    pub state:             RunState,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            current_iteration: 0,
            state: RunState::Idle,
        }
    }

    /// Advance one iteration. Returns the new iteration number.
    /// Panics if called outside a run — callers must start() first.
    pub fn advance(&mut self) -> Iteration {
        assert_eq!(self.state, RunState::Running, "advance() called outside a run");
        self.current_iteration += 1;
        self.current_iteration
    }

    pub fn start(&mut self)    { self.state = RunState::Running;   }
    pub fn complete(&mut self) { self.state = RunState::Completed; }
    pub fn fault(&mut self)    { self.state = RunState::Faulted;   }

    pub fn is_faulted(&self) -> bool {
        self.state == RunState::Faulted
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_while_running() {
        let mut clock = SimClock::new();
        assert_eq!(clock.state, RunState::Idle);
        clock.start();
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        clock.complete();
        assert_eq!(clock.state, RunState::Completed);
        assert_eq!(clock.current_iteration, 2);
    }

    #[test]
    #[should_panic(expected = "outside a run")]
    fn advance_while_idle_panics() {
        SimClock::new().advance();
    }

    #[test]
    fn reset_returns_to_idle_zero() {
        let mut clock = SimClock::new();
        clock.start();
        clock.advance();
        clock.fault();
        assert!(clock.is_faulted());
        clock.reset();
        assert_eq!(clock, SimClock::new());
    }
}
