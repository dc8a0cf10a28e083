#![no_main]

use arbitrary::Arbitrary;
use fode_integrate::{MIN_RTOL, ToleranceValue, validate_tol};
use fode_runtime::RuntimeMode;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct ValidateTolInput {
    n: u8,
    hardened: bool,
    rtol_vector: bool,
    atol_vector: bool,
    rtol_values: Vec<f64>,
    atol_values: Vec<f64>,
}

fn tolerance(as_vector: bool, values: &[f64]) -> ToleranceValue {
    let clipped: Vec<f64> = values.iter().copied().take(8).collect();
    if as_vector {
        ToleranceValue::Vector(clipped)
    } else {
        ToleranceValue::Scalar(clipped.first().copied().unwrap_or(0.0))
    }
}

fuzz_target!(|input: ValidateTolInput| {
    let mode = if input.hardened {
        RuntimeMode::Hardened
    } else {
        RuntimeMode::Strict
    };
    let n = usize::from(input.n);
    let rtol = tolerance(input.rtol_vector, &input.rtol_values);
    let atol = tolerance(input.atol_vector, &input.atol_values);
    if let Ok(validated) = validate_tol(rtol, atol, n, mode) {
        for i in 0..n {
            let r = validated.rtol.at(i);
            assert!(r.is_nan() || r >= MIN_RTOL, "rtol {r} escaped the clamp");
        }
    }
});
