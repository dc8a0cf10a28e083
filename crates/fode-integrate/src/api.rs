#![forbid(unsafe_code)]

use fode_runtime::RuntimeMode;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerConfig;
use crate::error::{IntegrateError, IntegrationFailure};
use crate::rhs::RightHandSide;
use crate::rk::RkSolver;
use crate::solver::{OdeSolverState, StepOutcome};
use crate::tableau::Method;
use crate::trajectory::Trajectory;
use crate::validation::ToleranceValue;

/// Every knob of an integration run.
///
/// Missing fields take their defaults when deserialized, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrateOptions {
    pub rtol: ToleranceValue,
    pub atol: ToleranceValue,
    /// Initial step size; chosen automatically when absent. Required for
    /// fixed-step runs.
    pub first_step: Option<f64>,
    /// Upper bound on the step size; unbounded when absent.
    pub max_step: Option<f64>,
    /// Smallest step the controller may propose, relative to the span.
    pub min_step: f64,
    /// Ceiling on step attempts, accepted and rejected alike.
    pub max_steps: usize,
    pub method: Method,
    /// `false` disables error control: every step of size `first_step` is
    /// accepted.
    pub adaptive: bool,
    pub controller: ControllerConfig,
    /// Keep the last N step decisions on the returned trajectory.
    pub evidence_capacity: Option<usize>,
    pub mode: RuntimeMode,
}

impl Default for IntegrateOptions {
    fn default() -> Self {
        Self {
            rtol: ToleranceValue::Scalar(1e-3),
            atol: ToleranceValue::Scalar(1e-6),
            first_step: None,
            max_step: None,
            min_step: 1e-14,
            max_steps: 100_000,
            method: Method::Rk45,
            adaptive: true,
            controller: ControllerConfig::default(),
            evidence_capacity: None,
            mode: RuntimeMode::Strict,
        }
    }
}

impl IntegrateOptions {
    #[must_use]
    pub fn tolerances(
        mut self,
        rtol: impl Into<ToleranceValue>,
        atol: impl Into<ToleranceValue>,
    ) -> Self {
        self.rtol = rtol.into();
        self.atol = atol.into();
        self
    }

    /// Same value for `rtol` and `atol`.
    #[must_use]
    pub fn tolerance(self, tol: f64) -> Self {
        self.tolerances(tol, tol)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn first_step(mut self, h: f64) -> Self {
        self.first_step = Some(h);
        self
    }

    /// Non-adaptive run with constant step `h` (the last step is shortened to
    /// land on `t1`).
    #[must_use]
    pub fn fixed_step(mut self, h: f64) -> Self {
        self.first_step = Some(h);
        self.adaptive = false;
        self
    }

    #[must_use]
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, capacity: usize) -> Self {
        self.evidence_capacity = Some(capacity);
        self
    }

    /// Parse options from JSON; unspecified fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Integrate `dy/dt = rhs(t, y, p)` from `t_span.0` to `t_span.1`.
///
/// Returns every accepted sample, starting with `(t0, y0)` and ending exactly
/// at `t1`. On failure the error carries the partial trajectory, the time of
/// the last accepted state and the step size being attempted.
pub fn integrate<R, P>(
    mut rhs: R,
    y0: &[f64],
    t_span: (f64, f64),
    p: &P,
    options: &IntegrateOptions,
) -> Result<Trajectory, IntegrationFailure>
where
    R: RightHandSide<P>,
    P: ?Sized,
{
    let (t0, _) = t_span;
    let mut trajectory = Trajectory::new(t0, y0);

    let mut solver = match RkSolver::new(y0, t_span, options) {
        Ok(solver) => solver,
        Err(error) => {
            log::warn!("rejected integration setup: {error}");
            return Err(IntegrationFailure {
                error,
                t: t0,
                h: 0.0,
                partial: trajectory,
            });
        }
    };

    loop {
        match solver.step_with(&mut rhs, p) {
            Ok(StepOutcome::Accepted { t, .. }) => {
                trajectory.push(t, solver.y());
                if solver.state() == OdeSolverState::Finished {
                    break;
                }
            }
            Ok(StepOutcome::Rejected { .. }) => {}
            Err(error) => {
                let (t, h) = (solver.t(), solver.h_abs());
                trajectory.seal(*solver.stats(), solver.take_evidence());
                return Err(IntegrationFailure {
                    error,
                    t,
                    h,
                    partial: trajectory,
                });
            }
        }
    }

    trajectory.seal(*solver.stats(), solver.take_evidence());
    Ok(trajectory)
}

/// [`integrate`] for callers that only need the final state.
pub fn integrate_to_end<R, P>(
    rhs: R,
    y0: &[f64],
    t_span: (f64, f64),
    p: &P,
    options: &IntegrateOptions,
) -> Result<Vec<f64>, IntegrateError>
where
    R: RightHandSide<P>,
    P: ?Sized,
{
    integrate(rhs, y0, t_span, p, options)
        .map(|trajectory| trajectory.last().1.to_vec())
        .map_err(|failure| failure.error)
}
