//! RejectConstant - re-request batches until one shows enough variation.
//!
//! The coefficient of variation (`|std| / |mean|`) is computed for every lane
//! along `axis` of the governed array; a batch is kept once the smallest one
//! exceeds `min_coefvar`. With `reject_probability < 1` an insufficient batch
//! is still kept with probability `1 - reject_probability`, drawn from a
//! generator seeded by the request so that equal requests decide equally.
//!
//! The loop has no attempt limit: an upstream that never produces a varying
//! batch keeps it spinning. Warnings are emitted after `report_after`, then
//! after twice that, and so on.

use std::time::Duration;

use ndarray::{ArrayD, Axis, Zip};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::array::ArrayData;
use crate::constants::{
  COEFVAR_EPSILON, DEFAULT_COEFVAR_AXIS, DEFAULT_MIN_COEFVAR, DEFAULT_REJECT_PROBABILITY,
  INITIAL_REPORT_AFTER,
};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{Batch, BatchProvider, BatchRequest, ProvidingFilter, SetupContext};
use crate::profiling::Timing;
use crate::types::ArrayKey;

const STAGE: &str = "RejectConstant";

/// Rejects batches whose `key` array is (close to) constant.
#[derive(Clone, Debug)]
pub struct RejectConstant {
  key: ArrayKey,
  min_coefvar: f64,
  reject_probability: f64,
  axis: usize,
  report_after: Duration,
}

impl RejectConstant {
  pub fn new(key: ArrayKey) -> Self {
    Self {
      key,
      min_coefvar: DEFAULT_MIN_COEFVAR,
      reject_probability: DEFAULT_REJECT_PROBABILITY,
      axis: DEFAULT_COEFVAR_AXIS,
      report_after: INITIAL_REPORT_AFTER,
    }
  }

  /// Smallest coefficient of variation a batch must exceed.
  pub fn with_min_coefvar(mut self, min_coefvar: f64) -> Self {
    self.min_coefvar = min_coefvar;
    self
  }

  /// Probability with which an insufficient batch is really rejected.
  pub fn with_reject_probability(mut self, probability: f64) -> PipelineResult<Self> {
    if !(0.0..=1.0).contains(&probability) {
      return Err(PipelineError::config(
        STAGE,
        format!("reject probability must lie in [0, 1], got {probability}"),
      ));
    }
    self.reject_probability = probability;
    Ok(self)
  }

  /// Axis (after squeezing unit axes) along which lanes are aggregated.
  pub fn with_axis(mut self, axis: usize) -> Self {
    self.axis = axis;
    self
  }

  /// Waiting time before the first warning.
  pub fn with_report_after(mut self, report_after: Duration) -> Self {
    self.report_after = report_after;
    self
  }

  /// Minimum coefficient of variation over all lanes of `data` along the
  /// configured axis. Unit axes are squeezed first.
  pub fn coefficient_of_variation(&self, data: &ArrayData) -> PipelineResult<f64> {
    let values = squeeze(data.to_f64());
    if self.axis >= values.ndim() || values.len_of(Axis(self.axis)) == 0 {
      return Err(PipelineError::Shape {
        key: self.key.clone(),
        reason: format!(
          "cannot aggregate over axis {} of data with squeezed shape {:?}",
          self.axis,
          values.shape()
        ),
      });
    }

    let axis = Axis(self.axis);
    let std = values.std_axis(axis, 0.0);
    let mean = values.mean_axis(axis).ok_or_else(|| PipelineError::Shape {
      key: self.key.clone(),
      reason: "empty axis".to_owned(),
    })?;
    let coefvar = Zip::from(&std)
      .and(&mean)
      .map_collect(|s, m| s.abs() / m.abs().max(COEFVAR_EPSILON));

    crate::array::min_max(coefvar.iter().copied())
      .map(|(min, _)| min)
      .ok_or_else(|| PipelineError::Shape {
        key: self.key.clone(),
        reason: "no lanes to aggregate".to_owned(),
      })
  }
}

/// Drop all axes of length one.
fn squeeze(mut values: ArrayD<f64>) -> ArrayD<f64> {
  for axis in (0..values.ndim()).rev() {
    if values.len_of(Axis(axis)) == 1 {
      values = values.index_axis_move(Axis(axis), 0);
    }
  }
  values
}

impl ProvidingFilter for RejectConstant {
  fn name(&self) -> &str {
    STAGE
  }

  fn setup(&mut self, ctx: &mut SetupContext<'_>) -> PipelineResult<()> {
    let spec = ctx.upstream(&self.key)?;
    if let Some(roi) = &spec.roi {
      if self.axis >= roi.dims() {
        return Err(PipelineError::config(
          STAGE,
          format!(
            "axis {} out of range for {}-dimensional {}",
            self.axis,
            roi.dims(),
            self.key
          ),
        ));
      }
    }
    Ok(())
  }

  fn provide(&self, upstream: &dyn BatchProvider, request: &BatchRequest) -> PipelineResult<Batch> {
    if !request.contains(&self.key) {
      return Err(PipelineError::missing_key(STAGE, &self.key));
    }

    let mut rng =
      (self.reject_probability < 1.0).then(|| ChaCha8Rng::seed_from_u64(request.random_seed()));

    let mut timing = Timing::new(STAGE, "provide");
    timing.start();
    let mut report_after = self.report_after;
    let mut rejected = 0usize;

    loop {
      let mut batch = upstream.request_batch(request)?;
      let array = batch
        .get(&self.key)
        .ok_or_else(|| PipelineError::missing_key(STAGE, &self.key))?;
      let coefvar = self.coefficient_of_variation(&array.data)?;

      let mut accepted = coefvar > self.min_coefvar;
      if !accepted {
        if let Some(rng) = rng.as_mut() {
          accepted = rng.random::<f64>() >= self.reject_probability;
        }
      }

      if accepted {
        debug!(key = %self.key, coefvar, roi = ?array.spec.roi, "accepted batch");
        timing.stop();
        batch.profiling_stats.add(&timing);
        return Ok(batch);
      }

      rejected += 1;
      debug!(
        key = %self.key,
        coefvar,
        roi = ?array.spec.roi,
        seed = request.random_seed(),
        "rejected batch"
      );

      if timing.elapsed() > report_after {
        warn!(
          key = %self.key,
          rejected,
          "rejected {rejected} batches, been waiting for a good one since {:?}",
          report_after
        );
        warn!(
          key = %self.key,
          "last batch rejected with coefficient of variation {coefvar} at {:?}",
          array.spec.roi
        );
        report_after *= 2;
      }
    }
  }
}

#[cfg(test)]
#[path = "reject_constant_test.rs"]
mod reject_constant_test;
