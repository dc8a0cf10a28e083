#![no_main]

//! Arbitrary spans, tolerances and step limits on a linear problem must
//! either succeed with a well-formed trajectory or fail cleanly.

use arbitrary::Arbitrary;
use fode_integrate::{IntegrateOptions, Method, in_place, integrate};
use fode_runtime::RuntimeMode;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct IntegrateInput {
    y0: Vec<f64>,
    rates: Vec<f64>,
    t0: f64,
    t1: f64,
    rtol: f64,
    atol: f64,
    first_step: Option<f64>,
    fixed: bool,
    rk23: bool,
    hardened: bool,
    max_steps: u16,
}

fn linear(dy: &mut [f64], _t: f64, y: &[f64], rates: &[f64]) {
    for (i, (d, v)) in dy.iter_mut().zip(y).enumerate() {
        *d = rates.get(i).copied().unwrap_or(-1.0) * v;
    }
}

fuzz_target!(|input: IntegrateInput| {
    let y0: Vec<f64> = input.y0.into_iter().take(6).collect();
    let rates: Vec<f64> = input.rates.into_iter().take(6).collect();
    let options = IntegrateOptions {
        first_step: input.first_step,
        adaptive: !input.fixed,
        max_steps: usize::from(input.max_steps).min(2_000),
        method: if input.rk23 { Method::Rk23 } else { Method::Rk45 },
        mode: if input.hardened {
            RuntimeMode::Hardened
        } else {
            RuntimeMode::Strict
        },
        ..IntegrateOptions::default().tolerances(input.rtol, input.atol)
    };

    match integrate(in_place(linear), &y0, (input.t0, input.t1), rates.as_slice(), &options) {
        Ok(traj) => {
            assert_eq!(traj.first().0, input.t0);
            assert_eq!(traj.last().0, input.t1);
            assert!(traj.times().windows(2).all(|w| w[1] > w[0]));
            assert!(traj.states().iter().all(|y| y.len() == y0.len()));
        }
        Err(failure) => {
            assert!(!failure.partial.is_empty());
            assert_eq!(failure.partial.last().0, failure.t);
            assert!(failure.partial.times().windows(2).all(|w| w[1] > w[0]));
        }
    }
});
