//! Pull-based batch pipeline.
//!
//! ```text
//!                 negotiation (once, upstream-first)
//!   ┌────────┐     ┌──────┐     ┌─────────────┐     ┌────────────────┐
//!   │ Source ├────►│ Crop ├────►│ NormalizeTo ├────►│ RejectConstant │
//!   └────────┘     └──────┘     └─────────────┘     └────────────────┘
//!  ProviderSpec   ROI shrunk      dtype = f32          unchanged
//!
//!                 execution (per request, downstream-first)
//!   request  ◄─────── prepare ◄──────── prepare ◄──────── provide ◄── caller
//!   batch    ───────► process ────────► process ────────► (retry?) ──► caller
//! ```
//!
//! # Node Kinds
//!
//! 1. **Source** ([`BatchProvider`]): publishes specs, materializes arrays
//! 2. **Filter** ([`BatchFilter`]): `prepare` the upstream request, `process`
//!    the returned batch; may auto-skip requests without its keys
//! 3. **Provider** ([`ProvidingFilter`]): calls upstream itself, e.g. in a
//!    rejection loop

pub mod types;

// Node protocol
pub mod node;
pub mod provider;
pub mod source;

// Test utilities
#[cfg(test)]
pub mod test_utils;


// Re-exports
pub use node::{Pipeline, PipelineNode};
pub use provider::{BatchFilter, BatchProvider, ProvidingFilter, SetupContext};
pub use source::ArraySource;
pub use types::{Batch, BatchRequest, ProviderSpec};
