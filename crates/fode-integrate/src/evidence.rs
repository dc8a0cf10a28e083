#![forbid(unsafe_code)]

//! Bounded FIFO audit trail of step-size decisions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One attempted step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Time at the start of the attempt.
    pub t: f64,
    /// Step size attempted.
    pub h: f64,
    /// Scaled RMS error norm; 0 for fixed-step runs.
    pub error_norm: f64,
    pub accepted: bool,
}

/// Keeps the most recent `capacity` step records.
///
/// Capacity is at least 1. When full, the oldest record is evicted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvidenceLedger {
    capacity: usize,
    entries: VecDeque<StepRecord>,
}

impl StepEvidenceLedger {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn record(&mut self, entry: StepRecord) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn latest(&self) -> Option<&StepRecord> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepRecord> {
        self.entries.iter()
    }

    /// Rejections among the retained records.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.entries.iter().filter(|e| !e.accepted).count()
    }

    /// One JSON object per line, oldest first. A NaN error norm (a rejected
    /// attempt in Strict mode) is written as `null`.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let lines = self
            .entries
            .iter()
            .map(serde_json::to_string)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(lines.join("\n"))
    }
}
