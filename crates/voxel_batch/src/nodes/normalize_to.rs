//! NormalizeTo - map array values onto a target interval.

use tracing::debug;

use super::normalize::{request_without_dtype, unit_values};
use crate::array::ArrayData;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{Batch, BatchFilter, BatchRequest, SetupContext};
use crate::types::{ArrayKey, DataType};

const STAGE: &str = "NormalizeTo";

/// Closed interval `[low, high]` described by its center and width.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Interval {
  center: f64,
  width: f64,
}

impl Interval {
  fn new([low, high]: [f64; 2]) -> PipelineResult<Self> {
    let width = (high - low).abs();
    if !(width > 0.0 && width.is_finite()) {
      return Err(PipelineError::config(
        STAGE,
        format!("interval [{low}, {high}] has no usable width"),
      ));
    }
    Ok(Self {
      center: (low + high) / 2.0,
      width,
    })
  }

  const UNIT: Self = Self {
    center: 0.5,
    width: 1.0,
  };
}

/// Rescales `key` from an input interval onto an output interval.
///
/// Without an input interval the factor is inferred from the element type
/// (see [`Normalize`](super::Normalize)) and the values are only scaled into
/// `[0, 1]`; the output interval applies to explicit input intervals.
#[derive(Clone, Debug)]
pub struct NormalizeTo {
  key: ArrayKey,
  out_interval: Interval,
  in_interval: Option<Interval>,
  dtype: DataType,
}

impl NormalizeTo {
  /// Normalize onto `[0, 1]` as `f32`.
  pub fn new(key: ArrayKey) -> Self {
    Self {
      key,
      out_interval: Interval::UNIT,
      in_interval: None,
      dtype: DataType::F32,
    }
  }

  /// Interval to normalize onto, e.g. `[-1, 1]` for `tanh` networks.
  pub fn with_out_interval(mut self, interval: [f64; 2]) -> PipelineResult<Self> {
    self.out_interval = Interval::new(interval)?;
    Ok(self)
  }

  /// Expected range of the input, instead of inferring it from the type.
  pub fn with_in_interval(mut self, interval: [f64; 2]) -> PipelineResult<Self> {
    self.in_interval = Some(Interval::new(interval)?);
    Ok(self)
  }

  pub fn with_dtype(mut self, dtype: DataType) -> Self {
    self.dtype = dtype;
    self
  }
}

impl BatchFilter for NormalizeTo {
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

    let values = match self.in_interval {
      Some(from) => {
        let to = self.out_interval;
        let scale = to.width / from.width;
        debug!(key = %self.key, scale, center = to.center, "mapping onto output interval");
        array.data.to_f64().mapv(|v| (v - from.center) * scale + to.center)
      }
      None => unit_values(STAGE, &self.key, &array.data, false)?,
    };

    array.data = ArrayData::from_f64(&values, self.dtype);
    array.spec.dtype = Some(self.dtype);
    Ok(())
  }
}

#[cfg(test)]
#[path = "normalize_to_test.rs"]
mod normalize_to_test;
