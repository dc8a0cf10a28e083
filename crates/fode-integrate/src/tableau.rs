#![forbid(unsafe_code)]

//! Butcher tableaux for the embedded explicit Runge-Kutta pairs.
//!
//! Both pairs are FSAL: the derivative at the accepted state is the extra
//! stage `k[n_stages]` and becomes `k[0]` of the next step.

use serde::{Deserialize, Serialize};

/// Butcher tableau for an embedded explicit Runge-Kutta pair.
#[derive(Debug)]
pub struct ButcherTableau {
    /// Lower-triangular stage coefficients, row `s` has `s` entries.
    pub a: &'static [&'static [f64]],
    /// Weights of the propagated (higher-order) solution.
    pub b: &'static [f64],
    /// Stage time fractions.
    pub c: &'static [f64],
    /// `b - b_hat` extended with the FSAL stage (length `n_stages + 1`).
    pub e: &'static [f64],
    pub n_stages: usize,
    /// Order of the propagated solution.
    pub order: usize,
    /// Order of the embedded solution used for the error estimate.
    pub error_estimator_order: usize,
}

impl ButcherTableau {
    /// Exponent applied to the error norm by the step-size controller.
    #[must_use]
    pub fn error_exponent(&self) -> f64 {
        -1.0 / (self.error_estimator_order as f64 + 1.0)
    }
}

// ═══════════════════════════════════════════════════════════════
// Dormand-Prince 5(4)
// ═══════════════════════════════════════════════════════════════

static RK45_C: &[f64] = &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

static RK45_A: &[&[f64]] = &[
    &[],
    &[1.0 / 5.0],
    &[3.0 / 40.0, 9.0 / 40.0],
    &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
    &[
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
    ],
    &[
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];

static RK45_B: &[f64] = &[
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

static RK45_E: &[f64] = &[
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

pub static RK45_TABLEAU: ButcherTableau = ButcherTableau {
    a: RK45_A,
    b: RK45_B,
    c: RK45_C,
    e: RK45_E,
    n_stages: 6,
    order: 5,
    error_estimator_order: 4,
};

// ═══════════════════════════════════════════════════════════════
// Bogacki-Shampine 3(2)
// ═══════════════════════════════════════════════════════════════

static RK23_C: &[f64] = &[0.0, 1.0 / 2.0, 3.0 / 4.0];

static RK23_A: &[&[f64]] = &[&[], &[1.0 / 2.0], &[0.0, 3.0 / 4.0]];

static RK23_B: &[f64] = &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0];

static RK23_E: &[f64] = &[5.0 / 72.0, -1.0 / 12.0, -1.0 / 9.0, 1.0 / 8.0];

pub static RK23_TABLEAU: ButcherTableau = ButcherTableau {
    a: RK23_A,
    b: RK23_B,
    c: RK23_C,
    e: RK23_E,
    n_stages: 3,
    order: 3,
    error_estimator_order: 2,
};

/// Integration method, resolved to a constant tableau when the solver is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Rk23,
    #[default]
    Rk45,
}

impl Method {
    #[must_use]
    pub fn tableau(self) -> &'static ButcherTableau {
        match self {
            Self::Rk23 => &RK23_TABLEAU,
            Self::Rk45 => &RK45_TABLEAU,
        }
    }

    #[must_use]
    pub fn order(self) -> usize {
        self.tableau().order
    }
}
