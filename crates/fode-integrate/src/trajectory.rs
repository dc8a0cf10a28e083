#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::evidence::StepEvidenceLedger;

/// Work counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStats {
    /// Right-hand-side evaluations.
    pub nfev: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

/// Accepted `(t, y)` samples of one run, in strictly increasing time.
///
/// The first sample is the initial condition. Spacing follows the adaptive
/// step sequence and is not uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
    stats: IntegrationStats,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    evidence: Option<StepEvidenceLedger>,
}

impl Trajectory {
    pub(crate) fn new(t0: f64, y0: &[f64]) -> Self {
        Self {
            times: vec![t0],
            states: vec![y0.to_vec()],
            stats: IntegrationStats::default(),
            evidence: None,
        }
    }

    pub(crate) fn push(&mut self, t: f64, y: &[f64]) {
        debug_assert!(self.times.last().is_none_or(|&last| t > last));
        self.times.push(t);
        self.states.push(y.to_vec());
    }

    pub(crate) fn seal(&mut self, stats: IntegrationStats, evidence: Option<StepEvidenceLedger>) {
        self.stats = stats;
        self.evidence = evidence;
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    /// Number of samples, including the initial condition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false: a trajectory holds at least its initial sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> (f64, &[f64]) {
        (self.times[0], &self.states[0])
    }

    #[must_use]
    pub fn last(&self) -> (f64, &[f64]) {
        let i = self.times.len() - 1;
        (self.times[i], &self.states[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> {
        self.times
            .iter()
            .copied()
            .zip(self.states.iter().map(Vec::as_slice))
    }

    /// Component `i` of every sample, e.g. one coordinate for plotting.
    pub fn component(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        self.states.iter().filter_map(move |y| y.get(i).copied())
    }

    #[must_use]
    pub fn stats(&self) -> &IntegrationStats {
        &self.stats
    }

    #[must_use]
    pub fn evidence(&self) -> Option<&StepEvidenceLedger> {
        self.evidence.as_ref()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<Vec<f64>>) {
        (self.times, self.states)
    }
}
