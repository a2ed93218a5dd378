//! Stage traits and the negotiation context.
//!
//! Three kinds of stage exist, each wrapped by a [`PipelineNode`] variant:
//!
//! - [`BatchProvider`]: a source (or any already-built chain). Publishes a
//!   [`ProviderSpec`] and answers requests.
//! - [`BatchFilter`]: rewrites the request on the way up (`prepare`) and the
//!   batch on the way down (`process`).
//! - [`ProvidingFilter`]: drives its upstream neighbor itself (`provide`),
//!   e.g. to retry until a batch is acceptable.
//!
//! [`PipelineNode`]: super::node::PipelineNode

use std::collections::BTreeSet;
use std::sync::Arc;

use super::types::{Batch, BatchRequest, ProviderSpec};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ArrayKey, ArraySpec};

/// Anything that can publish specs and serve requests.
pub trait BatchProvider: Send + Sync {
  /// Name used in logs and profiling.
  fn name(&self) -> &str {
    "BatchProvider"
  }

  /// Specs this provider can serve.
  fn spec(&self) -> &ProviderSpec;

  /// Produce a batch for `request`.
  ///
  /// Callers only request keys and ROIs that `spec()` publishes.
  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch>;
}

/// Blanket impl for boxed trait objects.
impl BatchProvider for Box<dyn BatchProvider> {
  fn name(&self) -> &str {
    (**self).name()
  }

  fn spec(&self) -> &ProviderSpec {
    (**self).spec()
  }

  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    (**self).request_batch(request)
  }
}

/// Shared providers, e.g. a source also inspected elsewhere.
impl<P: BatchProvider + ?Sized> BatchProvider for Arc<P> {
  fn name(&self) -> &str {
    (**self).name()
  }

  fn spec(&self) -> &ProviderSpec {
    (**self).spec()
  }

  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    (**self).request_batch(request)
  }
}

/// Stage that rewrites requests going upstream and batches coming back.
pub trait BatchFilter: Send + Sync {
  fn name(&self) -> &str;

  /// Negotiate: read upstream specs, declare updated/provided keys.
  fn setup(&mut self, ctx: &mut SetupContext<'_>) -> PipelineResult<()>;

  /// Upstream dependencies for the governed keys of `request`.
  ///
  /// Entries returned here replace the corresponding entries of the
  /// downstream request before it is sent upstream. The default asks for
  /// nothing beyond the request itself.
  fn prepare(&self, request: &BatchRequest) -> PipelineResult<BatchRequest> {
    Ok(BatchRequest::with_seed(request.random_seed()))
  }

  /// Rewrite governed entries of `batch` in place. Other entries must be left
  /// untouched.
  fn process(&self, _batch: &mut Batch, _request: &BatchRequest) -> PipelineResult<()> {
    Ok(())
  }
}

/// Stage that serves requests by driving its upstream neighbor directly.
pub trait ProvidingFilter: Send + Sync {
  fn name(&self) -> &str;

  fn setup(&mut self, ctx: &mut SetupContext<'_>) -> PipelineResult<()>;

  fn provide(&self, upstream: &dyn BatchProvider, request: &BatchRequest) -> PipelineResult<Batch>;
}

// =============================================================================
// SetupContext - negotiation phase
// =============================================================================

/// View of the upstream specs handed to a stage during negotiation.
///
/// Starts as a copy of the upstream registry; the stage records its changes
/// through [`updates`](Self::updates) and [`provides`](Self::provides).
pub struct SetupContext<'a> {
  stage: &'a str,
  upstream: &'a ProviderSpec,
  spec: ProviderSpec,
  updated: BTreeSet<ArrayKey>,
  provided: BTreeSet<ArrayKey>,
  autoskip: bool,
}

/// Outcome of a stage's negotiation.
pub(crate) struct Negotiated {
  pub spec: ProviderSpec,
  pub updated: BTreeSet<ArrayKey>,
  pub provided: BTreeSet<ArrayKey>,
  pub autoskip: bool,
}

impl<'a> SetupContext<'a> {
  pub(crate) fn new(stage: &'a str, upstream: &'a ProviderSpec) -> Self {
    Self {
      stage,
      upstream,
      spec: upstream.clone(),
      updated: BTreeSet::new(),
      provided: BTreeSet::new(),
      autoskip: false,
    }
  }

  /// Upstream spec for `key`, or a [`PipelineError::MissingKey`] naming this
  /// stage.
  pub fn upstream(&self, key: &ArrayKey) -> PipelineResult<&ArraySpec> {
    self
      .upstream
      .get(key)
      .ok_or_else(|| PipelineError::missing_key(self.stage, key))
  }

  /// Replace the spec of an upstream key.
  pub fn updates(&mut self, key: ArrayKey, spec: ArraySpec) -> PipelineResult<()> {
    if !self.upstream.contains(&key) {
      return Err(PipelineError::missing_key(self.stage, &key));
    }
    self.spec.insert(key.clone(), spec);
    self.updated.insert(key);
    Ok(())
  }

  /// Publish a key that upstream does not provide.
  pub fn provides(&mut self, key: ArrayKey, spec: ArraySpec) -> PipelineResult<()> {
    if self.upstream.contains(&key) {
      return Err(PipelineError::DuplicateKey { key });
    }
    self.spec.insert(key.clone(), spec);
    self.provided.insert(key);
    Ok(())
  }

  /// Skip this stage for requests that contain none of its keys.
  pub fn enable_autoskip(&mut self) {
    self.autoskip = true;
  }

  pub(crate) fn finish(self) -> Negotiated {
    Negotiated {
      spec: self.spec,
      updated: self.updated,
      provided: self.provided,
      autoskip: self.autoskip,
    }
  }
}
