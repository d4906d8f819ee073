//! Delayed-feedback queue.
//!
//! Entries are bucketed by due iteration. release(current) drains every
//! bucket with due <= current, so each entry surfaces exactly once and
//! never early. Within a bucket, entries keep enqueue order.

use crate::types::{Iteration, ModelId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub model:         ModelId,
    pub detected:      bool,
    pub selected_at:   Iteration,
    pub due_iteration: Iteration,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackQueue {
    buckets: BTreeMap<Iteration, Vec<FeedbackEntry>>,
    len:     usize,
}

impl FeedbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, entry: FeedbackEntry) {
        self.buckets.entry(entry.due_iteration).or_default().push(entry);
        self.len += 1;
    }

    /// Remove and return every entry due at or before `current`,
    /// ordered by due iteration, then enqueue order.
    pub fn release(&mut self, current: Iteration) -> Vec<FeedbackEntry> {
        let pending = match current.checked_add(1) {
            Some(next) => self.buckets.split_off(&next),
            None => BTreeMap::new(),
        };
        let ready = std::mem::replace(&mut self.buckets, pending);

        let released: Vec<FeedbackEntry> = ready.into_values().flatten().collect();
        self.len -= released.len();
        released
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Earliest due iteration still pending.
    pub fn next_due(&self) -> Option<Iteration> {
        self.buckets.keys().next().copied()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}
