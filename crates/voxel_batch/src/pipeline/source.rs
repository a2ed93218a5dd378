//! In-memory source serving sub-regions of stored arrays.

use tracing::debug;

use super::provider::BatchProvider;
use super::types::{Batch, BatchRequest, ProviderSpec};
use crate::array::{Array, ArrayData};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ArrayKey, ArraySpec};

/// Source backed by arrays held in memory.
///
/// Each stored array publishes its own spec. A request is answered by
/// cropping the requested ROI out of the stored data; arrays without a ROI
/// are returned whole.
#[derive(Debug, Default)]
pub struct ArraySource {
  name: String,
  arrays: Vec<(ArrayKey, Array)>,
  spec: ProviderSpec,
}

impl ArraySource {
  pub fn new() -> Self {
    Self {
      name: "ArraySource".to_owned(),
      ..Self::default()
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Add an array. Its data must match the ROI/voxel size of `array.spec`.
  pub fn with_array(mut self, key: ArrayKey, array: Array) -> PipelineResult<Self> {
    array.check_shape(&key)?;
    if self.spec.contains(&key) {
      return Err(PipelineError::DuplicateKey { key });
    }
    self.spec.insert(key.clone(), array.spec.clone());
    self.arrays.push((key, array));
    Ok(self)
  }

  /// Convenience for `with_array(key, Array::new(data, spec))`.
  pub fn with_data(
    self,
    key: ArrayKey,
    data: impl Into<ArrayData>,
    spec: ArraySpec,
  ) -> PipelineResult<Self> {
    self.with_array(key, Array::new(data, spec))
  }
}

impl BatchProvider for ArraySource {
  fn name(&self) -> &str {
    &self.name
  }

  fn spec(&self) -> &ProviderSpec {
    &self.spec
  }

  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    let mut batch = Batch::new();

    for (key, requested) in request.iter() {
      let (_, array) = self
        .arrays
        .iter()
        .find(|(k, _)| k == key)
        .ok_or_else(|| PipelineError::UnknownKey { key: key.clone() })?;

      let array = match &requested.roi {
        Some(roi) => array.crop(key, roi)?,
        None => array.clone(),
      };
      debug!(source = %self.name, %key, roi = ?array.spec.roi, "serving array");
      batch.insert(key.clone(), array);
    }

    Ok(batch)
  }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;
