#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Lifecycle of one integration run.
///
/// `Initializing` until the first step evaluates `f(t0, y0)` and picks the
/// initial step size; `Finished` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OdeSolverState {
    Initializing,
    Running,
    Finished,
    Failed,
}

impl OdeSolverState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

/// Result of one step attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The state advanced to `t` using step `h`.
    Accepted { t: f64, h: f64, error_norm: f64 },
    /// The state was kept; the next attempt uses `h_next`.
    Rejected { h: f64, h_next: f64, error_norm: f64 },
}

impl StepOutcome {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}
