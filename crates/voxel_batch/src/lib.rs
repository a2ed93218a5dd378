//! voxel_batch - Pull-based pipeline for requesting regions of voxel arrays
//!
//! A pipeline is a chain of stages ending in a source. Each stage publishes
//! which arrays it can deliver and over which region of interest (ROI); a
//! request for some arrays over some ROIs travels upstream, is rewritten by
//! every stage on the way, and the materialized batch travels back down.
//!
//! # Features
//!
//! - **Geometry**: d-dimensional integer coordinates and ROIs with
//!   containment, intersection and per-face growth
//! - **Negotiation**: stages validate and rewrite the upstream specs once, at
//!   construction, so invalid configurations fail before any data moves
//! - **Stages**: cropping, value normalization and rejection of constant
//!   batches with seeded, reproducible decisions
//! - **Diagnostics**: `tracing` spans per stage and per-batch timing stats
//!
//! # Example
//!
//! ```ignore
//! use voxel_batch::{ArrayKey, ArraySource, BatchRequest, Pipeline, Roi};
//! use voxel_batch::nodes::{Crop, NormalizeTo, RejectConstant};
//!
//! let raw = ArrayKey::new("RAW");
//! let source = ArraySource::new().with_data(raw.clone(), volume, spec)?;
//!
//! let pipeline = Pipeline::new(source)
//!   .filter(Crop::builder(raw.clone()).with_abs_negative([10, 10, 10]).with_abs_positive([10, 10, 10]).build()?)?
//!   .filter(NormalizeTo::new(raw.clone()))?
//!   .provider(RejectConstant::new(raw.clone()))?;
//!
//! let request = BatchRequest::new().add(raw.clone(), Roi::new([10, 10, 10], [80, 80, 80]));
//! let batch = pipeline.request_batch(&request)?;
//! ```

pub mod array;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod profiling;
pub mod types;

// Re-export commonly used items
pub use array::{Array, ArrayData, Element};
pub use error::{PipelineError, PipelineResult};
pub use geometry::{Coordinate, Roi};
pub use profiling::{ProfilingStats, Timing, TimingSummary};
pub use types::{ArrayKey, ArraySpec, DataType};

// Node protocol and chain
pub mod pipeline;
pub use pipeline::{
  ArraySource, Batch, BatchFilter, BatchProvider, BatchRequest, Pipeline, ProviderSpec,
  ProvidingFilter, SetupContext,
};

// Stages
pub mod nodes;
