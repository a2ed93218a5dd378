use thiserror::Error;

use crate::geometry::Roi;
use crate::types::ArrayKey;

/// Errors raised while building or running a pipeline.
///
/// All variants are fatal: nothing in the pipeline retries on them.
#[derive(Error, Debug)]
pub enum PipelineError {
  // ============================================================================
  // Configuration Errors (construction / negotiation)
  // ============================================================================
  #[error("invalid configuration for {stage}: {reason}")]
  Config { stage: String, reason: String },

  #[error("{stage} requires {key}, but it is not provided upstream")]
  MissingKey { stage: String, key: ArrayKey },

  #[error("{key} is already provided upstream and can not be provided again")]
  DuplicateKey { key: ArrayKey },

  // ============================================================================
  // Request Errors (execution)
  // ============================================================================
  #[error("{key} is requested, but not provided by this pipeline")]
  UnknownKey { key: ArrayKey },

  #[error("requested ROI {requested} for {key} is not contained in provided ROI {provided}")]
  RequestOutsideSpec {
    key: ArrayKey,
    requested: Roi,
    provided: Roi,
  },

  // ============================================================================
  // Geometry / Data Errors
  // ============================================================================
  #[error("dimension mismatch: expected {expected} dimensions, found {found}")]
  DimensionMismatch { expected: usize, found: usize },

  #[error("invalid ROI: {reason}")]
  InvalidRoi { reason: String },

  #[error("data for {key} does not match its spec: {reason}")]
  Shape { key: ArrayKey, reason: String },
}

impl PipelineError {
  /// Shorthand for a configuration error raised by `stage`.
  pub fn config(stage: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Config {
      stage: stage.into(),
      reason: reason.into(),
    }
  }

  /// Shorthand for a missing governed key.
  pub fn missing_key(stage: impl Into<String>, key: &ArrayKey) -> Self {
    Self::MissingKey {
      stage: stage.into(),
      key: key.clone(),
    }
  }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
