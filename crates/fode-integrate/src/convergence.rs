#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{IntegrateOptions, integrate};
use crate::error::IntegrationFailure;
use crate::rhs::RightHandSide;
use crate::step_size::rms_norm;
use crate::tableau::Method;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvergenceError {
    #[error("order estimation needs at least two step sizes, got {count}")]
    TooFewStepSizes { count: usize },

    #[error("step size {dt} must be positive and finite")]
    NonPositiveStepSize { dt: f64 },

    #[error(transparent)]
    Integration(#[from] IntegrationFailure),
}

/// Endpoint errors of a fixed-step refinement study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub dts: Vec<f64>,
    /// RMS error against the exact solution at `t1`, one per step size.
    pub errors: Vec<f64>,
    /// Least-squares slope of `ln(error)` against `ln(dt)`. Not finite when
    /// some error is exactly zero.
    pub observed_order: f64,
}

/// Integrate with each fixed step in `dts` and estimate the order of
/// accuracy from how the endpoint error scales with the step.
///
/// Step sizes that do not divide the span shorten the last step, which
/// perturbs the estimate slightly. A step longer than the span is clamped
/// to a single step.
pub fn verify_convergence<R, P, E>(
    mut rhs: R,
    y0: &[f64],
    t_span: (f64, f64),
    p: &P,
    method: Method,
    dts: &[f64],
    exact: E,
) -> Result<ConvergenceReport, ConvergenceError>
where
    R: RightHandSide<P>,
    P: ?Sized,
    E: Fn(f64) -> Vec<f64>,
{
    if dts.len() < 2 {
        return Err(ConvergenceError::TooFewStepSizes { count: dts.len() });
    }
    if let Some(&dt) = dts.iter().find(|dt| !(dt.is_finite() && **dt > 0.0)) {
        return Err(ConvergenceError::NonPositiveStepSize { dt });
    }

    let reference = exact(t_span.1);
    let span = t_span.1 - t_span.0;
    let mut errors = Vec::with_capacity(dts.len());
    for &dt in dts {
        // Fixed-step runs never reject, so this is exactly enough attempts.
        let steps = (span / dt).ceil() as usize + 1;
        let options = IntegrateOptions::default()
            .method(method)
            .fixed_step(dt)
            .max_steps(steps);
        let trajectory = integrate(&mut rhs, y0, t_span, p, &options)?;
        let (_, y_end) = trajectory.last();
        let error = rms_norm(y_end.iter().zip(&reference).map(|(a, b)| a - b));
        log::debug!("{method:?} dt = {dt:e}: endpoint error {error:e}");
        errors.push(error);
    }

    let observed_order = log_log_slope(dts, &errors);
    Ok(ConvergenceReport {
        dts: dts.to_vec(),
        errors,
        observed_order,
    })
}

fn log_log_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let lx: Vec<f64> = xs.iter().map(|x| x.ln()).collect();
    let ly: Vec<f64> = ys.iter().map(|y| y.ln()).collect();
    let mean_x = lx.iter().sum::<f64>() / n;
    let mean_y = ly.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in lx.iter().zip(&ly) {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x) * (x - mean_x);
    }
    sxy / sxx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential_decay;
    use crate::rhs::in_place;

    const DTS: [f64; 4] = [0.2, 0.1, 0.05, 0.025];

    fn decay_report(method: Method) -> ConvergenceReport {
        verify_convergence(
            in_place(exponential_decay),
            &[1.0],
            (0.0, 1.0),
            &1.0,
            method,
            &DTS,
            |t| vec![(-t).exp()],
        )
        .expect("convergence study")
    }

    #[test]
    fn dormand_prince_is_fifth_order() {
        let report = decay_report(Method::Rk45);
        assert!(
            (report.observed_order - 5.0).abs() < 0.5,
            "observed order {} (errors {:?})",
            report.observed_order,
            report.errors
        );
        assert!(report.errors.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn bogacki_shampine_is_third_order() {
        let report = decay_report(Method::Rk23);
        assert!(
            (report.observed_order - 3.0).abs() < 0.3,
            "observed order {}",
            report.observed_order
        );
    }

    #[test]
    fn rejects_degenerate_step_lists() {
        let run = |dts: &[f64]| {
            verify_convergence(
                in_place(exponential_decay),
                &[1.0],
                (0.0, 1.0),
                &1.0,
                Method::Rk45,
                dts,
                |t| vec![(-t).exp()],
            )
        };
        assert_eq!(
            run(&[0.1]),
            Err(ConvergenceError::TooFewStepSizes { count: 1 })
        );
        assert_eq!(
            run(&[0.1, -0.05]),
            Err(ConvergenceError::NonPositiveStepSize { dt: -0.05 })
        );
        assert!(matches!(
            run(&[0.1, f64::NAN]),
            Err(ConvergenceError::NonPositiveStepSize { .. })
        ));
        let report = run(&[0.1, 2.0]).expect("oversized step is one step");
        assert!(report.errors[1] > report.errors[0]);
        assert!(matches!(
            verify_convergence(
                in_place(exponential_decay),
                &[1.0],
                (1.0, 0.0),
                &1.0,
                Method::Rk45,
                &[0.1, 0.05],
                |t| vec![(-t).exp()],
            ),
            Err(ConvergenceError::Integration(_))
        ));
    }

    #[test]
    fn fine_grids_are_not_capped_by_the_default_step_limit() {
        let default_limit = IntegrateOptions::default().max_steps;
        let span = 0.002;
        let dts = [1e-8, 5e-9];
        assert!(span / dts[0] > default_limit as f64);
        let report = verify_convergence(
            in_place(exponential_decay),
            &[1.0],
            (0.0, span),
            &1.0,
            Method::Rk23,
            &dts,
            |t| vec![(-t).exp()],
        )
        .expect("fine grid");
        assert!(report.errors.iter().all(|e| e.is_finite() && *e < 1e-9));
    }

    #[test]
    fn slope_of_exact_power_law() {
        let xs = [1.0, 0.5, 0.25];
        let ys: Vec<f64> = xs.iter().map(|x: &f64| 3.0 * x.powi(4)).collect();
        assert!((log_log_slope(&xs, &ys) - 4.0).abs() < 1e-12);
    }
}
