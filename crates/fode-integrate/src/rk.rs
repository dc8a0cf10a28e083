#![forbid(unsafe_code)]

//! Adaptive explicit Runge-Kutta stepper.
//!
//! One [`RkSolver`] owns the state, the controller and every stage buffer of
//! a single run. Buffers are allocated once in [`RkSolver::new`]; stepping
//! does not allocate.

use fode_runtime::RuntimeMode;

use crate::api::IntegrateOptions;
use crate::controller::StepController;
use crate::error::IntegrateError;
use crate::evidence::{StepEvidenceLedger, StepRecord};
use crate::rhs::RightHandSide;
use crate::solver::{OdeSolverState, StepOutcome};
use crate::step_size::{InitialStepRequest, scaled, select_initial_step};
use crate::tableau::ButcherTableau;
use crate::trajectory::IntegrationStats;
use crate::validation::{
    ToleranceValue, validate_first_step, validate_max_step, validate_max_steps, validate_min_step,
    validate_span, validate_tol,
};

/// Fill the stages for a step of size `h` from `(t, y)` and form `y_new`.
///
/// `k[0]` is taken from `f`; `k[n_stages]` receives `f(t + h, y_new)`, which
/// the caller reuses as the next step's first stage.
#[allow(clippy::too_many_arguments)]
fn rk_step<R, P>(
    rhs: &mut R,
    p: &P,
    t: f64,
    h: f64,
    y: &[f64],
    f: &[f64],
    tableau: &ButcherTableau,
    k: &mut [Vec<f64>],
    y_stage: &mut [f64],
    y_new: &mut [f64],
) -> Result<(), IntegrateError>
where
    R: RightHandSide<P> + ?Sized,
    P: ?Sized,
{
    k[0].copy_from_slice(f);

    for s in 1..tableau.n_stages {
        let (done, rest) = k.split_at_mut(s);
        for (i, slot) in y_stage.iter_mut().enumerate() {
            let dy: f64 = tableau.a[s]
                .iter()
                .zip(done.iter())
                .map(|(a_sj, k_j)| a_sj * k_j[i])
                .sum();
            *slot = y[i] + h * dy;
        }
        rhs.eval(t + tableau.c[s] * h, y_stage, p, &mut rest[0])?;
    }

    for (i, slot) in y_new.iter_mut().enumerate() {
        let dy: f64 = tableau
            .b
            .iter()
            .zip(k.iter())
            .map(|(b_s, k_s)| b_s * k_s[i])
            .sum();
        *slot = y[i] + h * dy;
    }

    rhs.eval(t + h, y_new, p, &mut k[tableau.n_stages])
}

/// RMS over components of `(y_high - y_low) / scale`, with
/// `y_high - y_low = h * Σ e_s k_s` and
/// `scale_i = atol_i + rtol_i * max(|y_i|, |y_new_i|)`. A component with
/// zero error contributes zero even when its scale is zero.
fn error_norm(
    k: &[Vec<f64>],
    e: &[f64],
    h: f64,
    y: &[f64],
    y_new: &[f64],
    rtol: &ToleranceValue,
    atol: &ToleranceValue,
) -> f64 {
    let n = y.len();
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = (0..n)
        .map(|i| {
            let err: f64 = h * e.iter().zip(k).map(|(e_s, k_s)| e_s * k_s[i]).sum::<f64>();
            let scale = atol.at(i) + rtol.at(i) * y[i].abs().max(y_new[i].abs());
            let r = scaled(err, scale);
            r * r
        })
        .sum();
    (sum_sq / n as f64).sqrt()
}

/// Distance from `t` to the next representable f64 above it.
fn ulp_above(t: f64) -> f64 {
    let next = if t == 0.0 {
        f64::from_bits(1)
    } else if t > 0.0 {
        f64::from_bits(t.to_bits() + 1)
    } else {
        f64::from_bits(t.to_bits() - 1)
    };
    next - t
}

/// An explicit Runge-Kutta solver with embedded error control.
#[derive(Debug, Clone)]
pub struct RkSolver {
    mode: RuntimeMode,
    state: OdeSolverState,
    tableau: &'static ButcherTableau,
    controller: StepController,
    adaptive: bool,
    // Problem
    t0: f64,
    t: f64,
    y: Vec<f64>,
    t_bound: f64,
    // Tolerances and limits
    rtol: ToleranceValue,
    atol: ToleranceValue,
    max_step: f64,
    min_step: f64,
    max_steps: usize,
    first_step: Option<f64>,
    // Controller state
    f: Vec<f64>,
    h_abs: f64,
    previous_rejected: bool,
    attempts: usize,
    // Workspace
    k: Vec<Vec<f64>>,
    y_stage: Vec<f64>,
    y_new: Vec<f64>,
    stats: IntegrationStats,
    evidence: Option<StepEvidenceLedger>,
}

impl RkSolver {
    /// Validate the problem and allocate the workspace.
    ///
    /// No right-hand-side evaluation happens here; the first call to
    /// [`step_with`](Self::step_with) evaluates `f(t0, y0)` and, unless
    /// `first_step` is set, selects the initial step size.
    pub fn new(
        y0: &[f64],
        t_span: (f64, f64),
        options: &IntegrateOptions,
    ) -> Result<Self, IntegrateError> {
        let (t0, t_bound) = t_span;
        let span = validate_span(t0, t_bound)?;
        if y0.is_empty() {
            return Err(IntegrateError::EmptyState);
        }
        let n = y0.len();

        let tol = validate_tol(options.rtol.clone(), options.atol.clone(), n, options.mode)?;
        let max_step = validate_max_step(options.max_step.unwrap_or(f64::INFINITY))?;
        let min_step = validate_min_step(options.min_step)? * span;
        let max_steps = validate_max_steps(options.max_steps)?;
        let first_step = options
            .first_step
            .map(|h| validate_first_step(h, t0, t_bound))
            .transpose()?;
        if !options.adaptive && first_step.is_none() {
            return Err(IntegrateError::MissingFixedStep);
        }
        if options.mode.is_hardened() && y0.iter().any(|v| !v.is_finite()) {
            return Err(IntegrateError::NonFiniteState { t: t0 });
        }

        let tableau = options.method.tableau();
        let controller = StepController::new(options.controller, tableau.error_exponent())?;

        Ok(Self {
            mode: options.mode,
            state: OdeSolverState::Initializing,
            tableau,
            controller,
            adaptive: options.adaptive,
            t0,
            t: t0,
            y: y0.to_vec(),
            t_bound,
            rtol: tol.rtol,
            atol: tol.atol,
            max_step,
            min_step,
            max_steps,
            first_step,
            f: vec![0.0; n],
            h_abs: first_step.unwrap_or(0.0),
            previous_rejected: false,
            attempts: 0,
            k: vec![vec![0.0; n]; tableau.n_stages + 1],
            y_stage: vec![0.0; n],
            y_new: vec![0.0; n],
            stats: IntegrationStats::default(),
            evidence: options.evidence_capacity.map(StepEvidenceLedger::new),
        })
    }

    #[must_use]
    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> OdeSolverState {
        self.state
    }

    /// Time of the current (last accepted) state.
    #[must_use]
    pub fn t(&self) -> f64 {
        self.t
    }

    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Step size the next attempt will use (before clamping to the span).
    #[must_use]
    pub fn h_abs(&self) -> f64 {
        self.h_abs
    }

    #[must_use]
    pub fn stats(&self) -> &IntegrationStats {
        &self.stats
    }

    #[must_use]
    pub fn evidence(&self) -> Option<&StepEvidenceLedger> {
        self.evidence.as_ref()
    }

    pub(crate) fn take_evidence(&mut self) -> Option<StepEvidenceLedger> {
        self.evidence.take()
    }

    fn fail(&mut self, error: IntegrateError) -> IntegrateError {
        log::warn!(
            "integration failed at t = {} (h = {:e}): {error}",
            self.t,
            self.h_abs
        );
        self.state = OdeSolverState::Failed;
        error
    }

    fn check_finite(&self, values: &[f64], t: f64) -> Result<(), IntegrateError> {
        if self.mode.is_hardened() && values.iter().any(|v| !v.is_finite()) {
            return Err(IntegrateError::NonFiniteState { t });
        }
        Ok(())
    }

    fn initialize<R, P>(&mut self, rhs: &mut R, p: &P) -> Result<(), IntegrateError>
    where
        R: RightHandSide<P> + ?Sized,
        P: ?Sized,
    {
        rhs.eval(self.t, &self.y, p, &mut self.f)?;
        self.stats.nfev += 1;
        self.check_finite(&self.f, self.t)?;

        self.h_abs = match self.first_step {
            Some(h) => h,
            None => {
                let request = InitialStepRequest {
                    t0: self.t,
                    y0: &self.y,
                    t_bound: self.t_bound,
                    max_step: self.max_step,
                    f0: &self.f,
                    order: self.tableau.error_estimator_order as f64,
                    rtol: &self.rtol,
                    atol: &self.atol,
                };
                let h = select_initial_step(rhs, p, &request)?;
                self.stats.nfev += 1;
                h.max(self.min_step)
            }
        };
        self.state = OdeSolverState::Running;
        Ok(())
    }

    /// Attempt one step.
    ///
    /// On acceptance the state advances and the step size grows; on rejection
    /// the state is kept and the step size shrinks. Any error moves the solver
    /// to [`OdeSolverState::Failed`].
    pub fn step_with<R, P>(&mut self, rhs: &mut R, p: &P) -> Result<StepOutcome, IntegrateError>
    where
        R: RightHandSide<P> + ?Sized,
        P: ?Sized,
    {
        match self.state {
            OdeSolverState::Initializing => {
                if let Err(error) = self.initialize(rhs, p) {
                    return Err(self.fail(error));
                }
            }
            OdeSolverState::Running => {}
            state => return Err(IntegrateError::NotRunning { state }),
        }

        if self.attempts >= self.max_steps {
            let max_steps = self.max_steps;
            return Err(self.fail(IntegrateError::MaxStepsExceeded { max_steps }));
        }

        let t = self.t;
        let floor = 10.0 * ulp_above(t);
        let min_step = if self.adaptive {
            self.min_step.max(floor)
        } else {
            floor
        };
        let h_abs = self.h_abs.min(self.max_step);
        if h_abs < min_step {
            return Err(self.fail(IntegrateError::StepSizeUnderflow { h: h_abs, min_step }));
        }

        // Fixed-step times are computed from t0 so that rounding does not
        // accumulate over the run.
        let mut t_new = if self.adaptive {
            t + h_abs
        } else {
            self.t0 + (self.stats.accepted_steps + 1) as f64 * h_abs
        };
        // A remainder shorter than the minimum step is folded into this one.
        if t_new >= self.t_bound || self.t_bound - t_new < min_step {
            t_new = self.t_bound;
        }
        let h = t_new - t;
        self.attempts += 1;

        let result = rk_step(
            rhs,
            p,
            t,
            h,
            &self.y,
            &self.f,
            self.tableau,
            &mut self.k,
            &mut self.y_stage,
            &mut self.y_new,
        )
        .and_then(|()| {
            self.check_finite(&self.y_new, t_new)?;
            self.check_finite(&self.k[self.tableau.n_stages], t_new)
        });
        self.stats.nfev += self.tableau.n_stages;
        if let Err(error) = result {
            return Err(self.fail(error));
        }

        let error_norm = if self.adaptive {
            error_norm(
                &self.k,
                self.tableau.e,
                h,
                &self.y,
                &self.y_new,
                &self.rtol,
                &self.atol,
            )
        } else {
            0.0
        };

        let accepted = !self.adaptive || error_norm <= 1.0;
        if let Some(ledger) = self.evidence.as_mut() {
            ledger.record(StepRecord {
                t,
                h,
                error_norm,
                accepted,
            });
        }

        if !accepted {
            let h_next = h * self.controller.reject_factor(error_norm);
            log::debug!("rejected step at t = {t}: h = {h:e}, err = {error_norm:.3e}");
            self.h_abs = h_next;
            self.previous_rejected = true;
            self.stats.rejected_steps += 1;
            return Ok(StepOutcome::Rejected {
                h,
                h_next,
                error_norm,
            });
        }

        if self.adaptive {
            let factor = self
                .controller
                .accept_factor(error_norm, self.previous_rejected);
            self.h_abs = (h * factor).max(self.min_step);
        }
        log::trace!("accepted step t = {t} -> {t_new}, err = {error_norm:.3e}");

        self.t = t_new;
        std::mem::swap(&mut self.y, &mut self.y_new);
        self.f.copy_from_slice(&self.k[self.tableau.n_stages]);
        self.previous_rejected = false;
        self.stats.accepted_steps += 1;
        if self.t >= self.t_bound {
            self.state = OdeSolverState::Finished;
        }

        Ok(StepOutcome::Accepted {
            t: t_new,
            h,
            error_norm,
        })
    }
}
