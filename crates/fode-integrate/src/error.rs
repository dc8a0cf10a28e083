#![forbid(unsafe_code)]

use thiserror::Error;

use crate::solver::OdeSolverState;
use crate::trajectory::Trajectory;
use crate::validation::IntegrateValidationError;

/// Why an integration run stopped early.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrateError {
    #[error("invalid time span ({t0}, {t1}): bounds must be finite with t1 > t0")]
    InvalidSpan { t0: f64, t1: f64 },

    #[error("initial state must not be empty")]
    EmptyState,

    #[error("right-hand side produced {actual} components for a state of length {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The controller could not meet the tolerance with any step above the
    /// floor. Usually a sign that the problem is stiff.
    #[error("step size {h:e} fell below the minimum {min_step:e} without meeting tolerance")]
    StepSizeUnderflow { h: f64, min_step: f64 },

    #[error("step limit of {max_steps} attempts reached")]
    MaxStepsExceeded { max_steps: usize },

    #[error("non-finite state or derivative at t = {t}")]
    NonFiniteState { t: f64 },

    #[error("fixed-step integration requires `first_step`")]
    MissingFixedStep,

    #[error("solver is {state:?}; only a running solver can step")]
    NotRunning { state: OdeSolverState },

    #[error(transparent)]
    Validation(#[from] IntegrateValidationError),
}

/// A failed [`integrate`](crate::integrate) call.
///
/// Carries everything computed before the failure so the caller can decide
/// whether the partial trajectory is still useful.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("integration failed at t = {t} (h = {h:e}): {error}")]
pub struct IntegrationFailure {
    #[source]
    pub error: IntegrateError,
    /// Time of the last accepted state.
    pub t: f64,
    /// Step size that was being attempted, or 0 if stepping never started.
    pub h: f64,
    pub partial: Trajectory,
}

impl IntegrationFailure {
    #[must_use]
    pub fn kind(&self) -> &IntegrateError {
        &self.error
    }
}
