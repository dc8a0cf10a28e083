#![forbid(unsafe_code)]

//! Many initial conditions, one problem.
//!
//! Each member is an independent [`integrate`] call on a rayon worker. The
//! right-hand side is built per member from a factory, so stateful adapters
//! never cross threads.

use rayon::prelude::*;

use crate::api::{IntegrateOptions, integrate};
use crate::error::IntegrationFailure;
use crate::rhs::RightHandSide;
use crate::trajectory::Trajectory;

/// Integrate every state in `initial_states` over the same span.
///
/// Results are in input order. One member failing does not affect the others.
pub fn integrate_ensemble<F, R, P>(
    rhs_factory: F,
    initial_states: &[Vec<f64>],
    t_span: (f64, f64),
    p: &P,
    options: &IntegrateOptions,
) -> Vec<Result<Trajectory, IntegrationFailure>>
where
    F: Fn() -> R + Sync,
    R: RightHandSide<P>,
    P: Sync + ?Sized,
{
    log::debug!("integrating ensemble of {} members", initial_states.len());
    initial_states
        .par_iter()
        .map(|y0| integrate(rhs_factory(), y0, t_span, p, options))
        .collect()
}
