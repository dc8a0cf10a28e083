#![no_main]

use arbitrary::Arbitrary;
use fode_integrate::{
    validate_first_step, validate_max_step, validate_max_steps, validate_min_step, validate_span,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct StepBoundsInput {
    first_step: f64,
    t0: f64,
    t_bound: f64,
    max_step: f64,
    min_step: f64,
    max_steps: usize,
}

fuzz_target!(|input: StepBoundsInput| {
    if let Ok(span) = validate_span(input.t0, input.t_bound) {
        assert!(span > 0.0);
        if let Ok(h) = validate_first_step(input.first_step, input.t0, input.t_bound) {
            assert!(h > 0.0 && h <= span, "first step {h} outside (0, {span}]");
        }
    }
    let _ = validate_max_step(input.max_step);
    let _ = validate_min_step(input.min_step);
    let _ = validate_max_steps(input.max_steps);
});
