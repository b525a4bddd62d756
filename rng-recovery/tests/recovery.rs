// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end recovery scenarios against the public API.

use rng_recovery::{recover_rng, Engine, RecoveryError};
use rng_xorshift128plus::JsRng;

#[test]
fn spidermonkey_basic_recovery_round_trips() {
    let mut source = JsRng::new_spidermonkey(1, 0);
    let observations: Vec<f64> = (0..128).map(|_| source.math_random()).collect();

    let candidates: Vec<_> = recover_rng(&observations, Engine::SpiderMonkey).unwrap().collect();
    assert!(!candidates.is_empty(), "expected at least one verified candidate");

    // Every candidate must itself reproduce the same 128 outputs from
    // its own recovered state.
    for mut candidate in candidates {
        for &expected in &observations {
            assert_eq!(candidate.math_random(), expected);
        }
    }
}

#[test]
fn v8_basic_recovery_predicts_future_outputs() {
    let mut source = JsRng::new_v8(0x0123456789ABCDEF, 0xFEDCBA9876543210);
    let first_batch: Vec<f64> = (0..64).map(|_| source.math_random()).collect();
    let future: Vec<f64> = (0..10).map(|_| source.math_random()).collect();

    let mut candidates: Vec<_> = recover_rng(&first_batch, Engine::V8).unwrap().collect();
    assert!(!candidates.is_empty());

    let candidate = &mut candidates[0];
    for &expected in &future {
        assert_eq!(candidate.math_random(), expected);
    }
}

#[test]
fn v8_minimum_observations_on_a_batch_boundary_predicts_future_outputs() {
    // Only `Engine::draws()` (4) observations, all from a fresh cache, so
    // `window` in `verify_v8` is 4 — far short of 64. The no-mismatch case
    // must still resolve to offset 64, not to `window`.
    let mut source = JsRng::new_v8(0x0123456789ABCDEF, 0xFEDCBA9876543210);
    let minimal: Vec<f64> = (0..4).map(|_| source.math_random()).collect();
    let future: Vec<f64> = (0..10).map(|_| source.math_random()).collect();

    let mut candidates: Vec<_> = recover_rng(&minimal, Engine::V8).unwrap().collect();
    assert!(!candidates.is_empty());

    let candidate = &mut candidates[0];
    for &expected in &future {
        assert_eq!(candidate.math_random(), expected);
    }
}

#[test]
fn v8_offset_recovery_crosses_a_batch_boundary() {
    let mut source = JsRng::new_v8(0x0123456789ABCDEF, 0xFEDCBA9876543210);
    let _skip: Vec<f64> = (0..5).map(|_| source.math_random()).collect();
    let window: Vec<f64> = (0..64).map(|_| source.math_random()).collect(); // outputs 5..69
    let future: Vec<f64> = (0..5).map(|_| source.math_random()).collect(); // 69..74

    let mut candidates: Vec<_> = recover_rng(&window, Engine::V8).unwrap().collect();
    assert!(!candidates.is_empty(), "expected a candidate aligned to output 69");

    let candidate = &mut candidates[0];
    for &expected in &future {
        assert_eq!(candidate.math_random(), expected);
    }
}

#[test]
fn insufficient_observations_is_signaled() {
    let observations = [0.1, 0.2, 0.3];
    let err = recover_rng(&observations, Engine::V8).unwrap_err();
    match err {
        RecoveryError::InsufficientObservations { need, got } => {
            assert_eq!(need, 4);
            assert_eq!(got, 3);
        }
        other => panic!("expected InsufficientObservations, got {other:?}"),
    }
}

#[test]
fn constant_observations_do_not_match_spidermonkey() {
    let observations = [0.5; 128];
    let candidates: Vec<_> = recover_rng(&observations, Engine::SpiderMonkey).unwrap().collect();
    assert!(candidates.is_empty());
}

#[test]
fn cross_engine_recovery_rejects_mismatched_observations() {
    let mut source = JsRng::new_v8(0xDEADBEEFCAFEF00D, 0x1234567890ABCDEF);
    let observations: Vec<f64> = (0..128).map(|_| source.math_random()).collect();

    let candidates: Vec<_> = recover_rng(&observations, Engine::SpiderMonkey).unwrap().collect();
    assert!(candidates.is_empty(), "V8 outputs should not satisfy SpiderMonkey's linear model");
}

#[test]
fn malformed_observation_is_rejected() {
    let mut observations = vec![0.1; 128];
    observations[3] = f64::NAN;
    let err = recover_rng(&observations, Engine::SpiderMonkey).unwrap_err();
    assert!(matches!(err, RecoveryError::MalformedDouble { index: 3, .. }));
}
