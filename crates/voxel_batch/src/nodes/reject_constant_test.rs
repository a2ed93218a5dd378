use std::collections::BTreeSet;

use ndarray::{arr2, ArrayD, IxDyn};

use super::*;
use crate::array::Array;
use crate::geometry::Roi;
use crate::pipeline::test_utils::{
  capture_dispatch, constant_f32, ramp_source, raw, values_f32, ScriptedProvider,
};
use crate::pipeline::Pipeline;
use crate::types::ArraySpec;

fn roi() -> Roi {
  Roi::new([0, 0], [2, 4])
}

fn constant() -> Array {
  constant_f32(&roi(), 3.0)
}

fn varying() -> Array {
  values_f32(&roi(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
}

fn upstream(script: Vec<Array>) -> ScriptedProvider {
  ScriptedProvider::new(raw(), ArraySpec::new().with_roi(roi()), script)
}

fn request(seed: u64) -> BatchRequest {
  BatchRequest::with_seed(seed).add(raw(), roi())
}

// =============================================================================
// Coefficient of variation
// =============================================================================

#[test]
fn test_coefvar_of_constant_is_zero() {
  let reject = RejectConstant::new(raw());
  assert_eq!(reject.coefficient_of_variation(&constant().data).unwrap(), 0.0);
}

#[test]
fn test_coefvar_takes_minimum_lane() {
  let reject = RejectConstant::new(raw());
  // Row 0: mean 2, std 1. Row 1: mean 10, std 1
  let data: ArrayData = arr2(&[[1.0f32, 3.0], [9.0, 11.0]]).into_dyn().into();

  let coefvar = reject.coefficient_of_variation(&data).unwrap();
  assert!((coefvar - 0.1).abs() < 1e-12);
}

#[test]
fn test_coefvar_zero_mean_uses_epsilon() {
  let reject = RejectConstant::new(raw()).with_axis(0);
  let data: ArrayData = ndarray::arr1(&[-1.0f32, 1.0]).into_dyn().into();

  let coefvar = reject.coefficient_of_variation(&data).unwrap();
  assert_eq!(coefvar, 1.0 / COEFVAR_EPSILON);
}

#[test]
fn test_coefvar_squeezes_unit_axes() {
  let reject = RejectConstant::new(raw());
  // (1, 2, 1, 4) squeezes to (2, 4)
  let values: Vec<f32> = (1..=8).map(|v| v as f32).collect();
  let padded = ArrayD::from_shape_vec(IxDyn(&[1, 2, 1, 4]), values.clone()).unwrap();
  let flat = ArrayD::from_shape_vec(IxDyn(&[2, 4]), values).unwrap();

  let squeezed = reject.coefficient_of_variation(&padded.into()).unwrap();
  let plain = reject.coefficient_of_variation(&flat.into()).unwrap();
  assert_eq!(squeezed, plain);
}

#[test]
fn test_coefvar_axis_out_of_range() {
  let reject = RejectConstant::new(raw()).with_axis(2);

  assert!(matches!(
    reject.coefficient_of_variation(&constant().data),
    Err(PipelineError::Shape { .. })
  ));
}

// =============================================================================
// Rejection loop
// =============================================================================

#[test]
fn test_rejects_until_varying_batch() {
  let upstream = upstream(vec![constant(), constant(), constant(), varying()]);
  let reject = RejectConstant::new(raw());

  let batch = reject.provide(&upstream, &request(1)).unwrap();

  assert_eq!(upstream.calls(), 4);
  assert_eq!(batch.get(&raw()), Some(&varying()));
  // The request is forwarded unchanged on every attempt
  assert!(upstream.requests().iter().all(|r| r.get(&raw()) == request(1).get(&raw())));
}

#[test]
fn test_never_accepts_constant_with_certain_rejection() {
  let upstream = upstream(vec![constant(); 5]);
  let reject = RejectConstant::new(raw());

  // Script runs out before anything is accepted
  assert!(reject.provide(&upstream, &request(1)).is_err());
  assert_eq!(upstream.calls(), 6);
}

#[test]
fn test_zero_probability_accepts_first() {
  let upstream = upstream(vec![constant(), varying()]);
  let reject = RejectConstant::new(raw()).with_reject_probability(0.0).unwrap();

  let batch = reject.provide(&upstream, &request(9)).unwrap();

  assert_eq!(upstream.calls(), 1);
  assert_eq!(batch.get(&raw()), Some(&constant()));
}

#[test]
fn test_same_seed_same_decisions() {
  let reject = RejectConstant::new(raw()).with_reject_probability(0.7).unwrap();

  let attempts = |seed: u64| {
    let mut script = vec![constant(); 50];
    script.push(varying());
    let upstream = upstream(script);
    let batch = reject.provide(&upstream, &request(seed)).unwrap();
    (upstream.calls(), batch)
  };

  for seed in [0, 1, 42, u64::MAX] {
    let (calls_a, batch_a) = attempts(seed);
    let (calls_b, batch_b) = attempts(seed);
    assert_eq!(calls_a, calls_b);
    assert_eq!(batch_a.get(&raw()), batch_b.get(&raw()));
  }
}

#[test]
fn test_seed_drives_decisions() {
  let reject = RejectConstant::new(raw()).with_reject_probability(0.5).unwrap();

  let calls = |seed: u64| {
    let upstream = upstream(vec![constant(); 200]);
    reject.provide(&upstream, &request(seed)).unwrap();
    upstream.calls()
  };

  let counts: Vec<usize> = (0..16).map(calls).collect();
  for (seed, &count) in (0..16).zip(&counts) {
    // One draw per rejected constant batch, from a generator seeded by the request
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let expected = (1..).find(|_| rng.random::<f64>() >= 0.5).unwrap();
    assert_eq!(count, expected, "seed {seed}");
  }
  assert!(counts.iter().collect::<BTreeSet<_>>().len() > 1, "{counts:?}");
}

#[test]
fn test_missing_key_in_request() {
  let upstream = upstream(vec![varying()]);
  let reject = RejectConstant::new(raw());

  let result = reject.provide(&upstream, &BatchRequest::with_seed(0));
  assert!(matches!(result, Err(PipelineError::MissingKey { .. })));
  assert_eq!(upstream.calls(), 0);
}

#[test]
fn test_records_timing() {
  let upstream = upstream(vec![constant(), varying()]);
  let reject = RejectConstant::new(raw());

  let batch = reject.provide(&upstream, &request(1)).unwrap();

  let summary = batch.profiling_stats.get(STAGE, "provide").unwrap();
  assert_eq!(summary.count, 1);
}

#[test]
fn test_warns_and_doubles_report_threshold() {
  let (dispatch, logs) = capture_dispatch();
  let upstream = upstream(vec![constant(), constant(), varying()]);
  let reject = RejectConstant::new(raw()).with_report_after(Duration::ZERO);

  tracing::dispatcher::with_default(&dispatch, || {
    reject.provide(&upstream, &request(1)).unwrap();
  });

  let logs = logs.contents();
  assert!(logs.contains("rejected 1 batches"), "{logs}");
  assert!(logs.contains("last batch rejected with coefficient of variation 0"), "{logs}");
  assert!(logs.contains("accepted batch"), "{logs}");
}

// =============================================================================
// Configuration and negotiation
// =============================================================================

#[test]
fn test_invalid_probability() {
  for p in [-0.1, 1.5, f64::NAN] {
    assert!(matches!(
      RejectConstant::new(raw()).with_reject_probability(p),
      Err(PipelineError::Config { .. })
    ));
  }
}

#[test]
fn test_setup_checks_axis() {
  let source = ramp_source(&Roi::new([0], [16]));
  let result = Pipeline::new(source).provider(RejectConstant::new(raw()));
  assert!(matches!(result, Err(PipelineError::Config { .. })));

  let source = ramp_source(&Roi::new([0], [16]));
  assert!(Pipeline::new(source)
    .provider(RejectConstant::new(raw()).with_axis(0))
    .is_ok());
}

#[test]
fn test_setup_requires_key() {
  let source = ramp_source(&roi());
  let result = Pipeline::new(source).provider(RejectConstant::new(ArrayKey::new("MISSING")));
  assert!(matches!(result, Err(PipelineError::MissingKey { .. })));
}

#[test]
fn test_spec_passes_through() {
  let source = ramp_source(&roi());
  let expected = source.spec().clone();

  let pipeline = Pipeline::new(source).provider(RejectConstant::new(raw())).unwrap();
  assert_eq!(pipeline.spec(), &expected);
}
