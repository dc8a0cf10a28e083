#![forbid(unsafe_code)]

use crate::error::IntegrateError;
use crate::rhs::RightHandSide;
use crate::validation::ToleranceValue;

#[derive(Debug, Clone, PartialEq)]
pub struct InitialStepRequest<'a> {
    pub t0: f64,
    pub y0: &'a [f64],
    pub t_bound: f64,
    pub max_step: f64,
    /// `f(t0, y0)`, already evaluated by the caller.
    pub f0: &'a [f64],
    /// Order of the embedded error estimator.
    pub order: f64,
    pub rtol: &'a ToleranceValue,
    pub atol: &'a ToleranceValue,
}

/// `v / scale`, except that an exact zero stays zero even when the scale is
/// zero (`atol = 0` on a component that never moves).
pub(crate) fn scaled(v: f64, scale: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v / scale }
}

pub(crate) fn rms_norm(x: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = x.len();
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = x.map(|v| v * v).sum();
    (sum_sq / n as f64).sqrt()
}

/// Empirical first step (Hairer, Nørsett & Wanner, *Solving ODEs I*, II.4).
///
/// Costs one extra right-hand-side evaluation. The result is positive and
/// bounded by `max_step` and the span length.
pub fn select_initial_step<R, P>(
    rhs: &mut R,
    p: &P,
    request: &InitialStepRequest<'_>,
) -> Result<f64, IntegrateError>
where
    R: RightHandSide<P> + ?Sized,
    P: ?Sized,
{
    let InitialStepRequest {
        t0,
        y0,
        t_bound,
        max_step,
        f0,
        order,
        rtol,
        atol,
    } = *request;
    let interval = (t_bound - t0).abs();
    let n = y0.len();

    let scale: Vec<f64> = y0
        .iter()
        .enumerate()
        .map(|(i, yi)| atol.at(i) + yi.abs() * rtol.at(i))
        .collect();

    let d0 = rms_norm(y0.iter().zip(&scale).map(|(y, s)| scaled(*y, *s)));
    let d1 = rms_norm(f0.iter().zip(&scale).map(|(f, s)| scaled(*f, *s)));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    let h0 = h0.min(interval);

    let y1: Vec<f64> = y0.iter().zip(f0).map(|(y, f)| y + h0 * f).collect();
    let mut f1 = vec![0.0; n];
    rhs.eval(t0 + h0, &y1, p, &mut f1)?;

    let d2 = rms_norm(
        f1.iter()
            .zip(f0)
            .zip(&scale)
            .map(|((a, b), s)| scaled(a - b, *s)),
    ) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (order + 1.0))
    };

    let h = (100.0 * h0).min(h1).min(interval).min(max_step);
    log::debug!("initial step h = {h:e} (d0 = {d0:e}, d1 = {d1:e}, d2 = {d2:e})");

    // Degenerate scales (zero tolerances on a zero state) produce NaN.
    if h.is_finite() && h > 0.0 {
        Ok(h)
    } else {
        Ok(interval.min(max_step) * 1e-6)
    }
}
