//! Test utilities for pipeline tests.
//!
//! Provides fixture sources and a scripted provider for testing each stage in
//! isolation.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ndarray::{ArrayD, IxDyn};
use tracing::Dispatch;

use super::provider::BatchProvider;
use super::source::ArraySource;
use super::types::{Batch, BatchRequest, ProviderSpec};
use crate::array::{Array, ArrayData};
use crate::error::{PipelineError, PipelineResult};
use crate::geometry::Roi;
use crate::types::{ArrayKey, ArraySpec};

// =============================================================================
// Keys and fixtures
// =============================================================================

pub fn raw() -> ArrayKey {
  ArrayKey::new("RAW")
}

pub fn labels() -> ArrayKey {
  ArrayKey::new("GT_LABELS")
}

/// `u8` array over `roi` (unit voxels) filled with `index % 256`.
pub fn ramp_u8(roi: &Roi) -> Array {
  let shape: Vec<usize> = roi.shape().iter().map(|v| v as usize).collect();
  let len: usize = shape.iter().product();
  let data = ArrayD::from_shape_vec(IxDyn(&shape), (0..len).map(|i| (i % 256) as u8).collect())
    .expect("shape matches length");
  Array::new(data, ArraySpec::new().with_roi(roi.clone()))
}

/// Array over `roi` (unit voxels) holding `value` everywhere.
pub fn constant_f32(roi: &Roi, value: f32) -> Array {
  let shape: Vec<usize> = roi.shape().iter().map(|v| v as usize).collect();
  Array::new(ArrayD::from_elem(IxDyn(&shape), value), ArraySpec::new().with_roi(roi.clone()))
}

/// Array over `roi` from explicit `f32` values.
pub fn values_f32(roi: &Roi, values: Vec<f32>) -> Array {
  let shape: Vec<usize> = roi.shape().iter().map(|v| v as usize).collect();
  let data = ArrayD::from_shape_vec(IxDyn(&shape), values).expect("shape matches length");
  Array::new(data, ArraySpec::new().with_roi(roi.clone()))
}

/// Source serving a single `u8` ramp for [`raw`] over `roi`.
pub fn ramp_source(roi: &Roi) -> ArraySource {
  ArraySource::new()
    .with_array(raw(), ramp_u8(roi))
    .expect("fixture is consistent")
}

/// Source serving [`raw`] with arbitrary data.
pub fn data_source(roi: &Roi, data: impl Into<ArrayData>) -> ArraySource {
  ArraySource::new()
    .with_data(raw(), data, ArraySpec::new().with_roi(roi.clone()))
    .expect("fixture is consistent")
}

// =============================================================================
// Scripted provider
// =============================================================================

/// Provider that returns a fixed sequence of batches, one per call.
///
/// Fails once the script is exhausted, so loops under test always terminate.
/// Every request it sees is recorded.
pub struct ScriptedProvider {
  key: ArrayKey,
  spec: ProviderSpec,
  script: Vec<Array>,
  calls: AtomicUsize,
  requests: Mutex<Vec<BatchRequest>>,
}

impl ScriptedProvider {
  pub fn new(key: ArrayKey, spec: ArraySpec, script: Vec<Array>) -> Self {
    let mut provider_spec = ProviderSpec::new();
    provider_spec.insert(key.clone(), spec);
    Self {
      key,
      spec: provider_spec,
      script,
      calls: AtomicUsize::new(0),
      requests: Mutex::new(Vec::new()),
    }
  }

  /// Number of `request_batch` calls so far.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Requests received so far.
  pub fn requests(&self) -> Vec<BatchRequest> {
    self.requests.lock().expect("not poisoned").clone()
  }
}

impl BatchProvider for ScriptedProvider {
  fn name(&self) -> &str {
    "ScriptedProvider"
  }

  fn spec(&self) -> &ProviderSpec {
    &self.spec
  }

  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    self.requests.lock().expect("not poisoned").push(request.clone());
    let call = self.calls.fetch_add(1, Ordering::SeqCst);
    let array = self
      .script
      .get(call)
      .ok_or_else(|| PipelineError::config("ScriptedProvider", format!("script exhausted after {call} calls")))?;

    let mut batch = Batch::new();
    if request.contains(&self.key) {
      batch.insert(self.key.clone(), array.clone());
    }
    Ok(batch)
  }
}

// =============================================================================
// Log capture
// =============================================================================

/// Shared buffer the fmt subscriber writes into.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
  pub fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.lock().expect("not poisoned")).into_owned()
  }
}

impl io::Write for LogBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.lock().expect("not poisoned").extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Dispatcher logging everything at debug level and above into a buffer.
pub fn capture_dispatch() -> (Dispatch, LogBuffer) {
  let buffer = LogBuffer::default();
  let writer = buffer.clone();
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_ansi(false)
    .with_writer(move || writer.clone())
    .finish();
  (Dispatch::new(subscriber), buffer)
}
