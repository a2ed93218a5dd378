//! Pipeline nodes and the chain builder.
//!
//! A [`Pipeline`] is built upstream-first: the source is wrapped, then each
//! stage negotiates against the registry of the node before it. Requests
//! enter the last node and recurse upstream.
//!
//! # Usage
//!
//! ```ignore
//! let pipeline = Pipeline::new(source)
//!   .filter(Crop::builder(raw.clone()).with_abs_negative([10, 10, 10]).build()?)?
//!   .filter(NormalizeTo::new(raw.clone()))?
//!   .provider(RejectConstant::new(raw.clone()))?;
//!
//! let batch = pipeline.request_batch(&request)?;
//! ```

use std::collections::BTreeSet;

use tracing::{debug, debug_span, Dispatch};

use super::provider::{BatchFilter, BatchProvider, Negotiated, ProvidingFilter, SetupContext};
use super::types::{Batch, BatchRequest, ProviderSpec};
use crate::error::{PipelineError, PipelineResult};
use crate::profiling::Timing;
use crate::types::ArrayKey;

// =============================================================================
// PipelineNode
// =============================================================================

enum NodeKind {
  /// Leaf of the chain.
  Source(Box<dyn BatchProvider>),

  /// prepare → upstream → process.
  Filter {
    filter: Box<dyn BatchFilter>,
    upstream: Box<PipelineNode>,
    updated: BTreeSet<ArrayKey>,
    provided: BTreeSet<ArrayKey>,
    autoskip: bool,
  },

  /// Stage owns the upstream call.
  Provider {
    provider: Box<dyn ProvidingFilter>,
    upstream: Box<PipelineNode>,
  },
}

/// One element of the chain, with the specs it negotiated.
pub struct PipelineNode {
  kind: NodeKind,
  spec: ProviderSpec,
}

impl PipelineNode {
  /// Wrap a source. Its published spec is taken as-is.
  pub fn source(source: Box<dyn BatchProvider>) -> Self {
    let spec = source.spec().clone();
    Self {
      kind: NodeKind::Source(source),
      spec,
    }
  }

  /// Negotiate `filter` against `upstream` and chain it.
  pub fn filter(mut filter: Box<dyn BatchFilter>, upstream: PipelineNode) -> PipelineResult<Self> {
    let name = filter.name().to_owned();
    let mut ctx = SetupContext::new(&name, &upstream.spec);
    filter.setup(&mut ctx)?;
    let Negotiated {
      spec,
      updated,
      provided,
      autoskip,
    } = ctx.finish();

    debug!(
      stage = %name,
      ?updated,
      ?provided,
      autoskip,
      "negotiated filter"
    );

    Ok(Self {
      kind: NodeKind::Filter {
        filter,
        upstream: Box::new(upstream),
        updated,
        provided,
        autoskip,
      },
      spec,
    })
  }

  /// Negotiate a providing stage against `upstream` and chain it.
  pub fn provider(
    mut provider: Box<dyn ProvidingFilter>,
    upstream: PipelineNode,
  ) -> PipelineResult<Self> {
    let name = provider.name().to_owned();
    let mut ctx = SetupContext::new(&name, &upstream.spec);
    provider.setup(&mut ctx)?;
    let Negotiated {
      spec,
      updated,
      provided,
      autoskip,
    } = ctx.finish();

    // Key routing and auto-skip only exist for filters; a providing stage
    // forwards requests itself.
    if autoskip || !updated.is_empty() || !provided.is_empty() {
      return Err(PipelineError::config(
        &name,
        format!(
          "providing stages cannot declare updated ({updated:?}) or provided ({provided:?}) keys \
           or enable auto-skip ({autoskip})"
        ),
      ));
    }

    debug!(stage = %name, "negotiated provider");

    Ok(Self {
      kind: NodeKind::Provider {
        provider,
        upstream: Box::new(upstream),
      },
      spec,
    })
  }

  /// Reject requests for keys or ROIs this node does not publish.
  fn check_request(&self, request: &BatchRequest) -> PipelineResult<()> {
    for (key, requested) in request.iter() {
      let provided = self
        .spec
        .get(key)
        .ok_or_else(|| PipelineError::UnknownKey { key: key.clone() })?;

      if let (Some(requested), Some(provided)) = (&requested.roi, &provided.roi) {
        if !provided.contains(requested) {
          return Err(PipelineError::RequestOutsideSpec {
            key: key.clone(),
            requested: requested.clone(),
            provided: provided.clone(),
          });
        }
      }
    }
    Ok(())
  }

  fn request_filtered(
    &self,
    filter: &dyn BatchFilter,
    upstream: &PipelineNode,
    provided: &BTreeSet<ArrayKey>,
    request: &BatchRequest,
  ) -> PipelineResult<Batch> {
    let mut timing = Timing::new(filter.name(), "prepare");
    timing.start();
    let dependencies = filter.prepare(request)?;
    let mut upstream_request = request.clone();
    for key in provided {
      upstream_request.remove(key);
    }
    upstream_request.merge(dependencies);
    timing.stop();

    let mut batch = upstream.request_batch(&upstream_request)?;
    batch.profiling_stats.add(&timing);

    let mut timing = Timing::new(filter.name(), "process");
    timing.start();
    filter.process(&mut batch, request)?;
    batch.retain_requested(request);
    timing.stop();
    batch.profiling_stats.add(&timing);

    Ok(batch)
  }
}

impl BatchProvider for PipelineNode {
  fn name(&self) -> &str {
    match &self.kind {
      NodeKind::Source(source) => source.name(),
      NodeKind::Filter { filter, .. } => filter.name(),
      NodeKind::Provider { provider, .. } => provider.name(),
    }
  }

  fn spec(&self) -> &ProviderSpec {
    &self.spec
  }

  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    let _span = debug_span!("request_batch", stage = %self.name()).entered();
    self.check_request(request)?;

    match &self.kind {
      NodeKind::Source(source) => {
        let mut timing = Timing::new(source.name(), "provide");
        timing.start();
        let mut batch = source.request_batch(request)?;
        timing.stop();
        batch.profiling_stats.add(&timing);
        Ok(batch)
      }

      NodeKind::Filter {
        filter,
        upstream,
        updated,
        provided,
        autoskip,
      } => {
        let governed = request
          .keys()
          .any(|key| updated.contains(key) || provided.contains(key));
        if *autoskip && !governed {
          debug!(stage = %filter.name(), "skipping, no governed key requested");
          return upstream.request_batch(request);
        }
        self.request_filtered(&**filter, upstream, provided, request)
      }

      NodeKind::Provider { provider, upstream } => provider.provide(&**upstream, request),
    }
  }
}

// =============================================================================
// Pipeline - builder and entry point
// =============================================================================

/// A negotiated chain of stages, ready to serve requests.
///
/// Diagnostics go to the current `tracing` subscriber, or to the dispatcher
/// attached with [`Pipeline::with_dispatch`].
pub struct Pipeline {
  root: PipelineNode,
  dispatch: Option<Dispatch>,
}

impl Pipeline {
  /// Start a chain at `source`.
  pub fn new(source: impl BatchProvider + 'static) -> Self {
    Self {
      root: PipelineNode::source(Box::new(source)),
      dispatch: None,
    }
  }

  /// Route this pipeline's diagnostics to `dispatch`.
  pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
    self.dispatch = Some(dispatch);
    self
  }

  /// Append a filter; negotiation runs immediately.
  pub fn filter(self, filter: impl BatchFilter + 'static) -> PipelineResult<Self> {
    let Self { root, dispatch } = self;
    let root = in_scope(dispatch.as_ref(), || {
      PipelineNode::filter(Box::new(filter), root)
    })?;
    Ok(Self { root, dispatch })
  }

  /// Append a providing stage; negotiation runs immediately.
  pub fn provider(self, provider: impl ProvidingFilter + 'static) -> PipelineResult<Self> {
    let Self { root, dispatch } = self;
    let root = in_scope(dispatch.as_ref(), || {
      PipelineNode::provider(Box::new(provider), root)
    })?;
    Ok(Self { root, dispatch })
  }

  /// Specs published by the downstream-most node.
  pub fn spec(&self) -> &ProviderSpec {
    self.root.spec()
  }

  /// Resolve `request` through the whole chain.
  pub fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    in_scope(self.dispatch.as_ref(), || self.root.request_batch(request))
  }
}

impl BatchProvider for Pipeline {
  fn name(&self) -> &str {
    self.root.name()
  }

  fn spec(&self) -> &ProviderSpec {
    self.root.spec()
  }

  fn request_batch(&self, request: &BatchRequest) -> PipelineResult<Batch> {
    Pipeline::request_batch(self, request)
  }
}

fn in_scope<T>(dispatch: Option<&Dispatch>, f: impl FnOnce() -> T) -> T {
  match dispatch {
    Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
    None => f(),
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
