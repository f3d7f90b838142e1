//! Timeline — the benchmark bar sequence driving `current_index` (spec.md §4.2).

use chrono::{DateTime, Utc};

/// Owns the benchmark timestamp sequence and the advancing cursor.
#[derive(Debug, Clone)]
pub struct Timeline {
    timestamps: Vec<DateTime<Utc>>,
    current_index: usize,
}

impl Timeline {
    /// Timestamps must already be strictly increasing (benchmark series is
    /// set once before the run, per spec.md §3 "BenchmarkTimeline").
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            current_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn current_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.get(self.current_index).copied()
    }

    /// The timestamp one step ahead of `current_index`, if any.
    pub fn peek_next_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.get(self.current_index + 1).copied()
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.timestamps.len()
    }

    pub fn has_next(&self) -> bool {
        self.current_index < self.timestamps.len()
    }

    pub fn advance(&mut self) {
        self.current_index += 1;
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
    }
}
