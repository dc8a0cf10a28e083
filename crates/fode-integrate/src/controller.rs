#![forbid(unsafe_code)]

//! Step-size controller.
//!
//! Elementary integral controller: `h_new = h * safety * err^(-1/(q+1))`,
//! where `q` is the order of the embedded error estimator, clamped to
//! `[min_factor, max_factor]`.

use serde::{Deserialize, Serialize};

use crate::validation::IntegrateValidationError;

pub const SAFETY: f64 = 0.9;
pub const MIN_FACTOR: f64 = 0.2;
pub const MAX_FACTOR: f64 = 10.0;

/// Tunable controller constants.
///
/// Must satisfy `0 < safety < 1` and `0 < min_factor < 1 < max_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            safety: SAFETY,
            min_factor: MIN_FACTOR,
            max_factor: MAX_FACTOR,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), IntegrateValidationError> {
        if !(self.safety > 0.0 && self.safety < 1.0) {
            return Err(IntegrateValidationError::SafetyOutOfRange);
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0) {
            return Err(IntegrateValidationError::MinFactorOutOfRange);
        }
        if !(self.max_factor > 1.0 && self.max_factor.is_finite()) {
            return Err(IntegrateValidationError::MaxFactorOutOfRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepController {
    config: ControllerConfig,
    exponent: f64,
}

impl StepController {
    /// `exponent` is the tableau's [`error_exponent`](crate::ButcherTableau::error_exponent).
    pub fn new(config: ControllerConfig, exponent: f64) -> Result<Self, IntegrateValidationError> {
        config.validate()?;
        Ok(Self { config, exponent })
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Growth factor after an accepted step with error norm `err <= 1`.
    ///
    /// Growth is capped at 1 when the same step was rejected before.
    #[must_use]
    pub fn accept_factor(&self, err: f64, after_rejection: bool) -> f64 {
        let factor = if err == 0.0 {
            self.config.max_factor
        } else {
            self.config
                .max_factor
                .min(self.config.safety * err.powf(self.exponent))
        };
        if after_rejection {
            factor.min(1.0)
        } else {
            factor
        }
    }

    /// Shrink factor after a rejected step.
    ///
    /// A NaN norm falls through to `min_factor`.
    #[must_use]
    pub fn reject_factor(&self, err: f64) -> f64 {
        self.config
            .min_factor
            .max(self.config.safety * err.powf(self.exponent))
            .min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rk45_controller() -> StepController {
        StepController::new(ControllerConfig::default(), -0.2).expect("default config")
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn config_bounds_are_enforced() {
        let bad_safety = ControllerConfig {
            safety: 1.0,
            ..ControllerConfig::default()
        };
        assert_eq!(
            bad_safety.validate(),
            Err(IntegrateValidationError::SafetyOutOfRange)
        );
        let bad_min = ControllerConfig {
            min_factor: 1.5,
            ..ControllerConfig::default()
        };
        assert_eq!(
            bad_min.validate(),
            Err(IntegrateValidationError::MinFactorOutOfRange)
        );
        let bad_max = ControllerConfig {
            max_factor: 0.5,
            ..ControllerConfig::default()
        };
        assert_eq!(
            bad_max.validate(),
            Err(IntegrateValidationError::MaxFactorOutOfRange)
        );
    }

    #[test]
    fn zero_error_grows_by_max_factor() {
        assert_eq!(rk45_controller().accept_factor(0.0, false), MAX_FACTOR);
    }

    #[test]
    fn growth_is_capped_after_rejection() {
        let c = rk45_controller();
        assert!(c.accept_factor(1e-6, false) > 1.0);
        assert_eq!(c.accept_factor(1e-6, true), 1.0);
    }

    #[test]
    fn err_of_one_shrinks_by_safety() {
        let c = rk45_controller();
        assert!((c.accept_factor(1.0, false) - SAFETY).abs() < 1e-15);
    }

    #[test]
    fn rejection_always_shrinks() {
        let c = rk45_controller();
        for err in [1.0 + 1e-12, 2.0, 1e3, 1e300, f64::INFINITY, f64::NAN] {
            let factor = c.reject_factor(err);
            assert!(
                (MIN_FACTOR..1.0).contains(&factor),
                "err={err} gave factor {factor}"
            );
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: ControllerConfig = serde_json::from_str(r#"{"safety": 0.8}"#).expect("json");
        assert_eq!(cfg.safety, 0.8);
        assert_eq!(cfg.min_factor, MIN_FACTOR);
        assert_eq!(cfg.max_factor, MAX_FACTOR);
    }
}
