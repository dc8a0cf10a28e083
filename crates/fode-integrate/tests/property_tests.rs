//! Property tests for fode-integrate.
//!
//! Convention: test_{module}_{function}_{scenario}
//!
//! Seed replay: `PROPTEST_CASES=1000 cargo test -p fode-integrate --test property_tests`
//! Reproduce: `PROPTEST_SEED=<seed> cargo test -p fode-integrate --test property_tests`

use fode_integrate::{
    ControllerConfig, InitialStepRequest, IntegrateError, IntegrateOptions, MIN_RTOL, Method,
    StepController, StepEvidenceLedger, StepRecord, ToleranceValue, in_place, integrate,
    out_of_place, select_initial_step, validate_first_step, validate_span, validate_tol,
};
use fode_runtime::{RuntimeMode, TestLogEntry, TestResult};
use proptest::prelude::*;

fn method_strategy() -> impl Strategy<Value = Method> {
    prop_oneof![Just(Method::Rk23), Just(Method::Rk45)]
}

/// `dy_i = -(i + 1) * y_i + sin(t)`: damped, forced, any dimension.
fn forced_decay(dy: &mut [f64], t: f64, y: &[f64], _p: &()) {
    for (i, (d, v)) in dy.iter_mut().zip(y).enumerate() {
        *d = -((i + 1) as f64) * v + t.sin();
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 1: Trajectories start at t0, end exactly at t1, and keep
// strictly increasing times and the state dimension
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_integrate_trajectory_well_formed(
        t0 in -50.0f64..50.0,
        length in 0.01f64..20.0,
        y0 in prop::collection::vec(-10.0f64..10.0, 1..6),
        tol_exp in 3i32..8,
        method in method_strategy(),
    ) {
        let t1 = t0 + length;
        let tol = 10f64.powi(-tol_exp);
        let traj = integrate(
            in_place(forced_decay),
            &y0,
            (t0, t1),
            &(),
            &IntegrateOptions::default().method(method).tolerance(tol),
        )
        .expect("forced decay is well-behaved");

        prop_assert_eq!(traj.first().0, t0);
        prop_assert_eq!(traj.first().1, y0.as_slice());
        prop_assert_eq!(traj.last().0, t1);
        for w in traj.times().windows(2) {
            prop_assert!(w[1] > w[0], "times not increasing: {} then {}", w[0], w[1]);
        }
        for y in traj.states() {
            prop_assert_eq!(y.len(), y0.len());
        }
        let stats = traj.stats();
        prop_assert_eq!(stats.accepted_steps + 1, traj.len());
        let per_attempt = method.tableau().n_stages;
        // f(t0, y0), the initial-step probe, then n_stages per attempt.
        prop_assert_eq!(
            stats.nfev,
            2 + per_attempt * (stats.accepted_steps + stats.rejected_steps)
        );
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 2: Decay endpoint error stays near the requested tolerance
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_integrate_decay_error_within_tolerance(
        y0 in 0.1f64..10.0,
        rate in 0.1f64..5.0,
    ) {
        let traj = integrate(
            out_of_place(|_t, y: &[f64], k: &f64| vec![-k * y[0]]),
            &[y0],
            (0.0, 1.0),
            &rate,
            &IntegrateOptions::default().tolerances(1e-8, 1e-10),
        )
        .expect("decay");
        let expected = y0 * (-rate).exp();
        let err = (traj.last().1[0] - expected).abs();
        prop_assert!(err < 1e-6 * y0, "error {err} for y0 = {y0}, rate = {rate}");
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 3: Fixed-step runs take span / h steps and never reject
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_integrate_fixed_step_count(
        n_steps in 1usize..200,
        method in method_strategy(),
    ) {
        let h = 1.0 / n_steps as f64;
        let traj = integrate(
            out_of_place(|_t, y: &[f64], _p: &()| vec![-y[0]]),
            &[1.0],
            (0.0, 1.0),
            &(),
            &IntegrateOptions::default().method(method).fixed_step(h),
        )
        .expect("fixed step");
        prop_assert_eq!(traj.stats().rejected_steps, 0);
        prop_assert_eq!(traj.last().0, 1.0);
        prop_assert_eq!(traj.stats().accepted_steps, n_steps);
        prop_assert_eq!(traj.len(), n_steps + 1);
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 4: Backward or empty spans are InvalidSpan
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn test_validation_span_rejects_backward(
        t0 in -1e6f64..1e6,
        back in 0.0f64..1e6,
    ) {
        let t1 = t0 - back;
        prop_assert_eq!(
            validate_span(t0, t1),
            Err(IntegrateError::InvalidSpan { t0, t1 })
        );
        let failure = integrate(
            out_of_place(|_t, y: &[f64], _p: &()| vec![-y[0]]),
            &[1.0],
            (t0, t1),
            &(),
            &IntegrateOptions::default(),
        )
        .expect_err("backward span");
        prop_assert_eq!(failure.partial.len(), 1);
    }

    #[test]
    fn test_validation_span_accepts_forward(
        t0 in -1e6f64..1e6,
        length in 1e-3f64..1e6,
    ) {
        let t1 = t0 + length;
        let span = validate_span(t0, t1).expect("forward span");
        prop_assert!(span > 0.0);
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 5: Wrong-length out-of-place results are always reported
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_rhs_dimension_mismatch_detected(
        n in 1usize..8,
        m in 0usize..8,
    ) {
        prop_assume!(n != m);
        let failure = integrate(
            out_of_place(move |_t, _y: &[f64], _p: &()| vec![0.0; m]),
            &vec![1.0; n],
            (0.0, 1.0),
            &(),
            &IntegrateOptions::default(),
        )
        .expect_err("mismatch");
        prop_assert_eq!(
            failure.error,
            IntegrateError::DimensionMismatch { expected: n, actual: m }
        );
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 6: Tolerance validation clamps rtol, and first_step is clamped
// to the span
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn test_validation_tol_rtol_never_below_min(
        rtol in 0.0f64..1.0,
        atol in 0.0f64..1.0,
        n in 1usize..20,
    ) {
        let validated = validate_tol(
            ToleranceValue::Scalar(rtol),
            ToleranceValue::Scalar(atol),
            n,
            RuntimeMode::Strict,
        )
        .expect("non-negative scalars are valid");
        for i in 0..n {
            prop_assert!(validated.rtol.at(i) >= MIN_RTOL);
            prop_assert_eq!(validated.atol.at(i), atol);
        }
        prop_assert_eq!(validated.warnings.is_empty(), rtol >= MIN_RTOL);
    }

    #[test]
    fn test_validation_first_step_clamped_to_span(
        t0 in -100.0f64..100.0,
        interval in 0.01f64..100.0,
        fraction in 0.0f64..2.0,
    ) {
        let t_bound = t0 + interval;
        let step = fraction * interval;
        let result = validate_first_step(step, t0, t_bound);
        if step > 0.0 {
            prop_assert_eq!(result, Ok(step.min(t_bound - t0)));
        } else {
            prop_assert!(result.is_err(), "invalid step {step} should fail");
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 7: The initial step is positive and inside the span
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_step_size_select_initial_bounded(
        y0_val in -100.0f64..100.0,
        rate in 0.0f64..100.0,
        interval in 0.1f64..100.0,
        max_step in 0.01f64..10.0,
    ) {
        let y0 = [y0_val];
        let f0 = [-rate * y0_val];
        let tol = ToleranceValue::Scalar(1e-6);
        let request = InitialStepRequest {
            t0: 0.0,
            y0: &y0,
            t_bound: interval,
            max_step,
            f0: &f0,
            order: 4.0,
            rtol: &tol,
            atol: &tol,
        };
        let mut rhs = out_of_place(|_t, y: &[f64], k: &f64| vec![-k * y[0]]);
        let h = select_initial_step(&mut rhs, &rate, &request).expect("initial step");
        prop_assert!(h > 0.0, "h must be positive, got {h}");
        prop_assert!(h <= interval && h <= max_step, "h = {h}");
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 8: Controller factors stay inside [min_factor, max_factor]
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn test_controller_factors_bounded(
        err in 0.0f64..1e6,
        after_rejection in any::<bool>(),
    ) {
        let config = ControllerConfig::default();
        let controller = StepController::new(config, -0.2).expect("defaults");
        if err <= 1.0 {
            let f = controller.accept_factor(err, after_rejection);
            prop_assert!(f > 0.0 && f <= config.max_factor);
            if after_rejection {
                prop_assert!(f <= 1.0);
            }
        } else {
            let f = controller.reject_factor(err);
            prop_assert!(f >= config.min_factor && f < 1.0, "factor {f} for err {err}");
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Property 9: The evidence ledger never exceeds its capacity
// ═══════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_evidence_ledger_bounded(
        capacity in 0usize..32,
        records in 0usize..100,
    ) {
        let mut ledger = StepEvidenceLedger::new(capacity);
        for i in 0..records {
            ledger.record(StepRecord {
                t: i as f64,
                h: 1.0,
                error_norm: 0.5,
                accepted: i % 3 != 0,
            });
        }
        prop_assert!(ledger.len() <= capacity.max(1));
        prop_assert_eq!(ledger.len(), records.min(capacity.max(1)));
        if records > 0 {
            prop_assert_eq!(ledger.latest().map(|r| r.t), Some((records - 1) as f64));
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Structured logging convention test
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_integrate_structured_log_convention() {
    let entry = TestLogEntry::new(
        "test_integrate_trajectory_well_formed",
        "fode_integrate",
        "property test: endpoint and monotonic time over 128 cases",
    )
    .with_result(TestResult::Pass)
    .with_mode(RuntimeMode::Strict)
    .with_work(1234, 5);

    let json = entry.to_json_line();
    let parsed: serde_json::Value =
        serde_json::from_str(&json).expect("structured log must be valid JSON");
    assert!(parsed["test_id"].is_string());
    assert!(parsed["timestamp_ms"].is_number());
    assert_eq!(parsed["level"], "info");
    assert_eq!(parsed["module"], "fode_integrate");
    assert_eq!(parsed["nfev"], 1234);
}
