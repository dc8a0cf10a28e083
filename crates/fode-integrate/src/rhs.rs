#![forbid(unsafe_code)]

//! Right-hand-side adapters.
//!
//! A problem `dy/dt = f(t, y, p)` can be written out-of-place (returning a
//! fresh vector) or in-place (writing into a buffer the solver owns). Both
//! are wrapped once into a [`RightHandSide`] so the stepping loop is generic
//! over a single call shape.

use crate::error::IntegrateError;

/// Derivative evaluation used by the stepper.
///
/// `dy` always has the length of `y`. Implementations must not carry state
/// from one call to the next.
pub trait RightHandSide<P: ?Sized> {
    fn eval(&mut self, t: f64, y: &[f64], p: &P, dy: &mut [f64]) -> Result<(), IntegrateError>;
}

impl<P: ?Sized, R: RightHandSide<P> + ?Sized> RightHandSide<P> for &mut R {
    fn eval(&mut self, t: f64, y: &[f64], p: &P, dy: &mut [f64]) -> Result<(), IntegrateError> {
        (**self).eval(t, y, p, dy)
    }
}

/// `f(t, y, p) -> dy`.
#[derive(Debug, Clone, Copy)]
pub struct OutOfPlace<F>(pub F);

/// `f(dy, t, y, p)`, writing into `dy`.
///
/// `dy` always has the state's length, so a wrong-length result cannot be
/// reported as [`IntegrateError::DimensionMismatch`]: indexing past it
/// panics, and components the closure leaves unwritten keep the previous
/// stage's values. Use [`OutOfPlace`] when the length of the result needs
/// checking.
#[derive(Debug, Clone, Copy)]
pub struct InPlace<F>(pub F);

/// Wrap an out-of-place closure.
///
/// Prefer this over the tuple constructor when passing a closure: the bound
/// lets the compiler infer the argument types.
pub fn out_of_place<P, F>(f: F) -> OutOfPlace<F>
where
    P: ?Sized,
    F: FnMut(f64, &[f64], &P) -> Vec<f64>,
{
    OutOfPlace(f)
}

/// Wrap an in-place closure or function.
pub fn in_place<P, F>(f: F) -> InPlace<F>
where
    P: ?Sized,
    F: FnMut(&mut [f64], f64, &[f64], &P),
{
    InPlace(f)
}

impl<P, F> RightHandSide<P> for OutOfPlace<F>
where
    P: ?Sized,
    F: FnMut(f64, &[f64], &P) -> Vec<f64>,
{
    fn eval(&mut self, t: f64, y: &[f64], p: &P, dy: &mut [f64]) -> Result<(), IntegrateError> {
        let out = (self.0)(t, y, p);
        if out.len() != dy.len() {
            return Err(IntegrateError::DimensionMismatch {
                expected: dy.len(),
                actual: out.len(),
            });
        }
        dy.copy_from_slice(&out);
        Ok(())
    }
}

impl<P, F> RightHandSide<P> for InPlace<F>
where
    P: ?Sized,
    F: FnMut(&mut [f64], f64, &[f64], &P),
{
    fn eval(&mut self, t: f64, y: &[f64], p: &P, dy: &mut [f64]) -> Result<(), IntegrateError> {
        (self.0)(dy, t, y, p);
        Ok(())
    }
}
