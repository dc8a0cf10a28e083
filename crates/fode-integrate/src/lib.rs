#![forbid(unsafe_code)]

pub mod api;
pub mod controller;
pub mod convergence;
pub mod ensemble;
pub mod error;
pub mod evidence;
pub mod models;
pub mod rhs;
pub mod rk;
pub mod solver;
pub mod step_size;
pub mod tableau;
pub mod trajectory;
pub mod validation;

pub use api::{IntegrateOptions, integrate, integrate_to_end};
pub use controller::{ControllerConfig, MAX_FACTOR, MIN_FACTOR, SAFETY, StepController};
pub use convergence::{ConvergenceError, ConvergenceReport, verify_convergence};
pub use ensemble::integrate_ensemble;
pub use error::{IntegrateError, IntegrationFailure};
pub use evidence::{StepEvidenceLedger, StepRecord};
pub use models::{
    DoublePendulumParams, PendulumParams, double_pendulum, double_pendulum_energy,
    exponential_decay, harmonic_oscillator, henon_heiles, henon_heiles_energy, pendulum,
    pendulum_energy,
};
pub use rhs::{InPlace, OutOfPlace, RightHandSide, in_place, out_of_place};
pub use rk::RkSolver;
pub use solver::{OdeSolverState, StepOutcome};
pub use step_size::{InitialStepRequest, select_initial_step};
pub use tableau::{ButcherTableau, Method, RK23_TABLEAU, RK45_TABLEAU};
pub use trajectory::{IntegrationStats, Trajectory};
pub use validation::{
    EPS, IntegrateValidationError, MIN_RTOL, ToleranceValue, ToleranceWarning, ValidatedTolerance,
    validate_first_step, validate_max_step, validate_max_steps, validate_min_step, validate_span,
    validate_tol,
};
