#![forbid(unsafe_code)]

//! Standard test problems as in-place right-hand sides.
//!
//! Each function has the shape `fn(dy, t, y, p)` and plugs into
//! [`in_place`](crate::in_place). Physical constants are passed through `p`.

use serde::{Deserialize, Serialize};

/// `dy_i/dt = -rate * y_i`, any dimension.
pub fn exponential_decay(dy: &mut [f64], _t: f64, y: &[f64], rate: &f64) {
    for (d, v) in dy.iter_mut().zip(y) {
        *d = -rate * v;
    }
}

/// `x'' = -omega^2 x` with state `[x, v]`.
pub fn harmonic_oscillator(dy: &mut [f64], _t: f64, y: &[f64], omega: &f64) {
    dy[0] = y[1];
    dy[1] = -omega * omega * y[0];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    pub gravity: f64,
    pub length: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            length: 1.0,
        }
    }
}

/// Undamped simple pendulum, state `[theta, omega]`.
pub fn pendulum(dy: &mut [f64], _t: f64, y: &[f64], p: &PendulumParams) {
    dy[0] = y[1];
    dy[1] = -(p.gravity / p.length) * y[0].sin();
}

/// Energy per unit mass; conserved along exact solutions.
#[must_use]
pub fn pendulum_energy(y: &[f64], p: &PendulumParams) -> f64 {
    0.5 * p.length * p.length * y[1] * y[1] + p.gravity * p.length * (1.0 - y[0].cos())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoublePendulumParams {
    pub gravity: f64,
    pub m1: f64,
    pub m2: f64,
    pub l1: f64,
    pub l2: f64,
}

impl Default for DoublePendulumParams {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            m1: 1.0,
            m2: 1.0,
            l1: 1.0,
            l2: 1.0,
        }
    }
}

/// Planar double pendulum with point masses, state
/// `[theta1, omega1, theta2, omega2]` (angles from the downward vertical).
pub fn double_pendulum(dy: &mut [f64], _t: f64, y: &[f64], p: &DoublePendulumParams) {
    let DoublePendulumParams {
        gravity: g,
        m1,
        m2,
        l1,
        l2,
    } = *p;
    let (th1, w1, th2, w2) = (y[0], y[1], y[2], y[3]);
    let delta = th2 - th1;
    let (sin_d, cos_d) = delta.sin_cos();
    let m = m1 + m2;

    let den1 = m * l1 - m2 * l1 * cos_d * cos_d;
    let den2 = (l2 / l1) * den1;

    dy[0] = w1;
    dy[1] = (m2 * l1 * w1 * w1 * sin_d * cos_d
        + m2 * g * th2.sin() * cos_d
        + m2 * l2 * w2 * w2 * sin_d
        - m * g * th1.sin())
        / den1;
    dy[2] = w2;
    dy[3] = (-m2 * l2 * w2 * w2 * sin_d * cos_d
        + m * (g * th1.sin() * cos_d - l1 * w1 * w1 * sin_d - g * th2.sin()))
        / den2;
}

#[must_use]
pub fn double_pendulum_energy(y: &[f64], p: &DoublePendulumParams) -> f64 {
    let DoublePendulumParams {
        gravity: g,
        m1,
        m2,
        l1,
        l2,
    } = *p;
    let (th1, w1, th2, w2) = (y[0], y[1], y[2], y[3]);
    let coupling = 2.0 * l1 * l2 * w1 * w2 * (th1 - th2).cos();
    let kinetic = 0.5 * m1 * l1 * l1 * w1 * w1
        + 0.5 * m2 * (l1 * l1 * w1 * w1 + l2 * l2 * w2 * w2 + coupling);
    let potential = -(m1 + m2) * g * l1 * th1.cos() - m2 * g * l2 * th2.cos();
    kinetic + potential
}

/// Hénon-Heiles system, state `[x, y, px, py]`.
pub fn henon_heiles(dy: &mut [f64], _t: f64, y: &[f64], _p: &()) {
    let (x, q, px, py) = (y[0], y[1], y[2], y[3]);
    dy[0] = px;
    dy[1] = py;
    dy[2] = -x - 2.0 * x * q;
    dy[3] = -q - x * x + q * q;
}

/// `H = (px^2 + py^2)/2 + (x^2 + y^2)/2 + x^2 y - y^3/3`.
#[must_use]
pub fn henon_heiles_energy(y: &[f64]) -> f64 {
    let (x, q, px, py) = (y[0], y[1], y[2], y[3]);
    0.5 * (px * px + py * py) + 0.5 * (x * x + q * q) + x * x * q - q * q * q / 3.0
}
