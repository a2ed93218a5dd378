//! Normalize - scale array values into `[0, 1]`.
//!
//! Without an explicit factor the scale is inferred from the element type of
//! the data that arrives:
//!
//! | input | factor          |
//! |-------|-----------------|
//! | `u8`  | `1 / 255`       |
//! | `u16` | `1 / 65535`     |
//! | `f32` | `1` (see below) |
//!
//! `f32` data that looks like a `tanh` output (`min` in `[-1, 0)`, `max <= 1`)
//! is first remapped with `(x + 1) / 2`. Other element types need an explicit
//! factor.

use ndarray::ArrayD;
use tracing::debug;

use crate::array::ArrayData;
use crate::constants::{U16_MAX, U8_MAX};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{Batch, BatchFilter, BatchRequest, SetupContext};
use crate::types::{ArrayKey, DataType};

const STAGE: &str = "Normalize";

/// Rescales `key` by a fixed or inferred factor and casts it to `dtype`.
#[derive(Clone, Debug)]
pub struct Normalize {
  key: ArrayKey,
  factor: Option<f64>,
  dtype: DataType,
}

impl Normalize {
  /// Infer the factor from the data type, output `f32`.
  pub fn new(key: ArrayKey) -> Self {
    Self {
      key,
      factor: None,
      dtype: DataType::F32,
    }
  }

  pub fn with_factor(mut self, factor: f64) -> Self {
    self.factor = Some(factor);
    self
  }

  pub fn with_dtype(mut self, dtype: DataType) -> Self {
    self.dtype = dtype;
    self
  }
}

impl BatchFilter for Normalize {
  fn name(&self) -> &str {
    STAGE
  }

  fn setup(&mut self, ctx: &mut SetupContext<'_>) -> PipelineResult<()> {
    ctx.enable_autoskip();
    let spec = ctx.upstream(&self.key)?.clone().with_dtype(self.dtype);
    ctx.updates(self.key.clone(), spec)
  }

  fn prepare(&self, request: &BatchRequest) -> PipelineResult<BatchRequest> {
    Ok(request_without_dtype(&self.key, request))
  }

  fn process(&self, batch: &mut Batch, _request: &BatchRequest) -> PipelineResult<()> {
    let Some(array) = batch.get_mut(&self.key) else {
      return Ok(());
    };

    let values = match self.factor {
      Some(factor) => {
        debug!(key = %self.key, factor, "scaling");
        array.data.to_f64() * factor
      }
      None => unit_values(STAGE, &self.key, &array.data, true)?,
    };

    array.data = ArrayData::from_f64(&values, self.dtype);
    array.spec.dtype = Some(self.dtype);
    Ok(())
  }
}

// =============================================================================
// Shared with NormalizeTo
// =============================================================================

/// Upstream request for `key` with any type requirement dropped.
pub(crate) fn request_without_dtype(key: &ArrayKey, request: &BatchRequest) -> BatchRequest {
  let mut dependencies = BatchRequest::with_seed(request.random_seed());
  if let Some(spec) = request.get(key) {
    let mut spec = spec.clone();
    spec.dtype = None;
    dependencies.insert(key.clone(), spec);
  }
  dependencies
}

/// Values of `data` mapped into `[0, 1]` by the factor its type implies.
///
/// With `clip`, the remapped `tanh` range is additionally clipped to
/// `[0, 1]`.
pub(crate) fn unit_values(
  stage: &str,
  key: &ArrayKey,
  data: &ArrayData,
  clip: bool,
) -> PipelineResult<ArrayD<f64>> {
  debug!(%key, dtype = %data.dtype(), "automatically normalizing");

  match data.dtype() {
    DataType::U8 => Ok(data.to_f64() / U8_MAX),
    DataType::U16 => Ok(data.to_f64() / U16_MAX),
    DataType::F32 => {
      let mut values = data.to_f64();
      if let Some((min, max)) = data.min_max() {
        if (-1.0..0.0).contains(&min) && max <= 1.0 {
          debug!(%key, "assuming data on [-1, 1], as produced by tanh");
          values.mapv_inplace(|v| (v + 1.0) / 2.0);
          if clip {
            values.mapv_inplace(|v| v.clamp(0.0, 1.0));
          }
        }
      }

      if let Some((min, max)) = crate::array::min_max(values.iter().copied()) {
        if !(min >= 0.0 && max <= 1.0) {
          return Err(PipelineError::config(
            stage,
            format!(
              "values of {key} are float but not in [0, 1] (found [{min}, {max}]), \
               don't know how to normalize; please provide a scale"
            ),
          ));
        }
      }
      Ok(values)
    }
    other => Err(PipelineError::config(
      stage,
      format!("automatic normalization for {other} not implemented, please provide a scale"),
    )),
  }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;
