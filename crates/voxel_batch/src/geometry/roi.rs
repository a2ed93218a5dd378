//! Axis-aligned region of interest in integer world coordinates.

use std::fmt;

use super::Coordinate;
use crate::error::{PipelineError, PipelineResult};

/// Region of interest: an offset and a shape of equal dimensionality.
///
/// Covers the half-open box `[offset, offset + shape)` on every axis.
/// Shape components are never negative.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Roi {
  offset: Coordinate,
  shape: Coordinate,
}

impl Roi {
  /// Create a new ROI from offset and shape.
  ///
  /// # Panics
  /// Debug-asserts matching dimensions and a non-negative shape.
  pub fn new(offset: impl Into<Coordinate>, shape: impl Into<Coordinate>) -> Self {
    let offset = offset.into();
    let shape = shape.into();
    debug_assert_eq!(offset.dims(), shape.dims(), "ROI offset/shape dims differ");
    debug_assert!(shape.is_non_negative(), "ROI shape must be >= 0 on all axes");
    Self { offset, shape }
  }

  /// Fallible constructor for untrusted input.
  pub fn try_new(offset: impl Into<Coordinate>, shape: impl Into<Coordinate>) -> PipelineResult<Self> {
    let offset = offset.into();
    let shape = shape.into();
    if offset.dims() != shape.dims() {
      return Err(PipelineError::DimensionMismatch {
        expected: offset.dims(),
        found: shape.dims(),
      });
    }
    if !shape.is_non_negative() {
      return Err(PipelineError::InvalidRoi {
        reason: format!("negative shape {shape}"),
      });
    }
    Ok(Self { offset, shape })
  }

  #[inline]
  pub fn offset(&self) -> &Coordinate {
    &self.offset
  }

  #[inline]
  pub fn shape(&self) -> &Coordinate {
    &self.shape
  }

  /// Inclusive low corner (same as the offset).
  #[inline]
  pub fn begin(&self) -> &Coordinate {
    &self.offset
  }

  /// Exclusive high corner.
  pub fn end(&self) -> Coordinate {
    &self.offset + &self.shape
  }

  #[inline]
  pub fn dims(&self) -> usize {
    self.offset.dims()
  }

  /// Number of grid units covered.
  pub fn size(&self) -> i64 {
    self.shape.product()
  }

  /// True if the ROI covers nothing on at least one axis.
  pub fn is_empty(&self) -> bool {
    self.shape.iter().any(|s| s == 0)
  }

  /// Check if `other` lies entirely inside this ROI.
  pub fn contains(&self, other: &Roi) -> bool {
    self.dims() == other.dims()
      && other.begin().all_ge(self.begin())
      && other.end().all_le(&self.end())
  }

  /// Check if a point lies inside the half-open box.
  pub fn contains_point(&self, point: &Coordinate) -> bool {
    let end = self.end();
    point.dims() == self.dims()
      && point.all_ge(self.begin())
      && point.iter().zip(end.iter()).all(|(p, e)| p < e)
  }

  /// Intersection with another ROI, `None` if they do not overlap.
  pub fn intersect(&self, other: &Roi) -> Option<Roi> {
    if self.dims() != other.dims() {
      return None;
    }
    let begin = self.begin().max(other.begin());
    let end = self.end().min(&other.end());
    if !begin.all_le(&end) {
      return None;
    }
    let shape = &end - &begin;
    Some(Roi::new(begin, shape))
  }

  /// Move the ROI by `by`.
  pub fn shift(&self, by: &Coordinate) -> Roi {
    Roi::new(&self.offset + by, self.shape.clone())
  }

  /// Move the low face outward by `negative` and the high face outward by
  /// `positive`. Negative amounts shrink the ROI.
  ///
  /// # Panics
  /// Debug-asserts the resulting shape stays non-negative.
  pub fn grow(&self, negative: &Coordinate, positive: &Coordinate) -> Roi {
    let offset = &self.offset - negative;
    let shape = &(&self.shape + negative) + positive;
    Roi::new(offset, shape)
  }
}

impl fmt::Debug for Roi {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}

impl fmt::Display for Roi {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}:{}] ({})", self.begin(), self.end(), self.shape)
  }
}

#[cfg(test)]
#[path = "roi_test.rs"]
mod roi_test;
