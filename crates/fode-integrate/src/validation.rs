#![forbid(unsafe_code)]

use fode_runtime::RuntimeMode;
use serde::{Deserialize, Serialize};

use crate::error::IntegrateError;

pub const EPS: f64 = f64::EPSILON;
pub const MIN_RTOL: f64 = 100.0 * EPS;

/// A tolerance given either once for every component or per component.
///
/// Deserializes from a bare number or an array of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToleranceValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl ToleranceValue {
    /// Tolerance that applies to component `i`.
    ///
    /// Callers validate vector lengths first; an out-of-range index reads the
    /// last entry rather than panicking inside the stepping loop.
    #[must_use]
    pub fn at(&self, i: usize) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::Vector(values) => values
                .get(i)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0.0),
        }
    }

    fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        match self {
            Self::Scalar(value) => Self::Scalar(f(value)),
            Self::Vector(values) => Self::Vector(values.into_iter().map(f).collect()),
        }
    }

    fn any(&self, mut predicate: impl FnMut(f64) -> bool) -> bool {
        match self {
            Self::Scalar(value) => predicate(*value),
            Self::Vector(values) => values.iter().copied().any(predicate),
        }
    }

    fn len_if_vector(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(values) => Some(values.len()),
        }
    }
}

impl From<f64> for ToleranceValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for ToleranceValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToleranceWarning {
    RtolClamped { minimum: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTolerance {
    pub rtol: ToleranceValue,
    pub atol: ToleranceValue,
    pub mode: RuntimeMode,
    pub warnings: Vec<ToleranceWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrateValidationError {
    FirstStepMustBePositive,
    MaxStepMustBePositive,
    MinStepOutOfRange,
    MaxStepsMustBePositive,
    AtolWrongShape { expected: usize, actual: usize },
    RtolWrongShape { expected: usize, actual: usize },
    AtolMustBePositive,
    ToleranceNotFinite,
    SafetyOutOfRange,
    MinFactorOutOfRange,
    MaxFactorOutOfRange,
}

impl std::fmt::Display for IntegrateValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstStepMustBePositive => write!(f, "`first_step` must be positive."),
            Self::MaxStepMustBePositive => write!(f, "`max_step` must be positive."),
            Self::MinStepOutOfRange => write!(f, "`min_step` must lie in (0, 1)."),
            Self::MaxStepsMustBePositive => write!(f, "`max_steps` must be positive."),
            Self::AtolWrongShape { .. } => write!(f, "`atol` has wrong shape."),
            Self::RtolWrongShape { .. } => write!(f, "`rtol` has wrong shape."),
            Self::AtolMustBePositive => write!(f, "`atol` must be positive."),
            Self::ToleranceNotFinite => write!(f, "`rtol` and `atol` must be finite."),
            Self::SafetyOutOfRange => write!(f, "`safety` must lie in (0, 1)."),
            Self::MinFactorOutOfRange => write!(f, "`min_factor` must lie in (0, 1)."),
            Self::MaxFactorOutOfRange => write!(f, "`max_factor` must exceed 1."),
        }
    }
}

impl std::error::Error for IntegrateValidationError {}

/// Check that `(t0, t1)` is a finite, strictly increasing span and return
/// its length.
pub fn validate_span(t0: f64, t1: f64) -> Result<f64, IntegrateError> {
    if !t0.is_finite() || !t1.is_finite() || t1 <= t0 {
        return Err(IntegrateError::InvalidSpan { t0, t1 });
    }
    Ok(t1 - t0)
}

/// `first_step` is a guess: anything longer than the span is shortened to
/// the span.
pub fn validate_first_step(
    first_step: f64,
    t0: f64,
    t_bound: f64,
) -> Result<f64, IntegrateValidationError> {
    if first_step <= 0.0 || first_step.is_nan() {
        return Err(IntegrateValidationError::FirstStepMustBePositive);
    }
    let interval = (t_bound - t0).abs();
    if first_step > interval {
        log::debug!("first_step {first_step:e} clamped to the span {interval:e}");
        return Ok(interval);
    }
    Ok(first_step)
}

pub fn validate_max_step(max_step: f64) -> Result<f64, IntegrateValidationError> {
    if max_step <= 0.0 || max_step.is_nan() {
        return Err(IntegrateValidationError::MaxStepMustBePositive);
    }
    Ok(max_step)
}

/// `min_step` is relative to the span length.
pub fn validate_min_step(min_step: f64) -> Result<f64, IntegrateValidationError> {
    if !(min_step > 0.0 && min_step < 1.0) {
        return Err(IntegrateValidationError::MinStepOutOfRange);
    }
    Ok(min_step)
}

pub fn validate_max_steps(max_steps: usize) -> Result<usize, IntegrateValidationError> {
    if max_steps == 0 {
        return Err(IntegrateValidationError::MaxStepsMustBePositive);
    }
    Ok(max_steps)
}

pub fn validate_tol(
    rtol: ToleranceValue,
    atol: ToleranceValue,
    n: usize,
    mode: RuntimeMode,
) -> Result<ValidatedTolerance, IntegrateValidationError> {
    if rtol.any(|x| !x.is_finite()) || atol.any(|x| !x.is_finite()) {
        return Err(IntegrateValidationError::ToleranceNotFinite);
    }

    if let Some(len) = rtol.len_if_vector()
        && len != n
    {
        return Err(IntegrateValidationError::RtolWrongShape {
            expected: n,
            actual: len,
        });
    }

    let mut warnings = Vec::new();
    let rtol = if rtol.any(|x| x < MIN_RTOL) {
        log::warn!("rtol below {MIN_RTOL:e} clamped");
        warnings.push(ToleranceWarning::RtolClamped { minimum: MIN_RTOL });
        rtol.map(|x| x.max(MIN_RTOL))
    } else {
        rtol
    };

    if let Some(len) = atol.len_if_vector()
        && len != n
    {
        return Err(IntegrateValidationError::AtolWrongShape {
            expected: n,
            actual: len,
        });
    }

    if atol.any(|x| x < 0.0) {
        return Err(IntegrateValidationError::AtolMustBePositive);
    }

    Ok(ValidatedTolerance {
        rtol,
        atol,
        mode,
        warnings,
    })
}
