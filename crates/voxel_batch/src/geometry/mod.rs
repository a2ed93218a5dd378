//! Integer geometry for voxel requests.
//!
//! # Module Structure
//!
//! - [`coordinate`]: `Coordinate` - immutable integer vector of any
//!   dimensionality
//! - [`roi`]: `Roi` - axis-aligned half-open region (offset + shape)

pub mod coordinate;
pub mod roi;

// Re-exports
pub use coordinate::Coordinate;
pub use roi::Roi;
