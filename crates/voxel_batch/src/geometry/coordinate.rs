//! Coordinate - immutable integer vector of fixed dimensionality.
//!
//! Used for positions, shapes, margins and voxel sizes. Arithmetic is
//! element-wise; operands must have the same number of dimensions.

use std::fmt;
use std::ops::{Add, Div, Index, Mul, Neg, Sub};

use smallvec::SmallVec;

/// Integer vector, stored inline for up to 4 dimensions.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Coordinate(SmallVec<[i64; 4]>);

impl Coordinate {
  /// Create a coordinate from any sequence of integers.
  pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
    Self(values.into_iter().collect())
  }

  /// Coordinate of `dims` dimensions, all set to `value`.
  pub fn splat(value: i64, dims: usize) -> Self {
    Self(SmallVec::from_elem(value, dims))
  }

  /// All-zero coordinate.
  pub fn zeros(dims: usize) -> Self {
    Self::splat(0, dims)
  }

  /// Number of dimensions.
  #[inline]
  pub fn dims(&self) -> usize {
    self.0.len()
  }

  #[inline]
  pub fn as_slice(&self) -> &[i64] {
    &self.0
  }

  pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
    self.0.iter().copied()
  }

  /// Product of all components (number of voxels for a shape).
  pub fn product(&self) -> i64 {
    self.0.iter().product()
  }

  /// Check that every component is `>= 0`.
  pub fn is_non_negative(&self) -> bool {
    self.0.iter().all(|&v| v >= 0)
  }

  /// Element-wise `self[i] <= other[i]` on all axes.
  pub fn all_le(&self, other: &Coordinate) -> bool {
    self.dims() == other.dims() && self.iter().zip(other.iter()).all(|(a, b)| a <= b)
  }

  /// Element-wise `self[i] >= other[i]` on all axes.
  pub fn all_ge(&self, other: &Coordinate) -> bool {
    other.all_le(self)
  }

  /// Element-wise minimum.
  pub fn min(&self, other: &Coordinate) -> Coordinate {
    self.zip_with(other, i64::min)
  }

  /// Element-wise maximum.
  pub fn max(&self, other: &Coordinate) -> Coordinate {
    self.zip_with(other, i64::max)
  }

  /// Scale each component by a per-axis factor, flooring the result.
  ///
  /// Used to turn fractional margins into voxel counts.
  pub fn scale_floor(&self, factors: &[f64]) -> Coordinate {
    debug_assert_eq!(self.dims(), factors.len());
    Self(
      self
        .iter()
        .zip(factors)
        .map(|(v, f)| (v as f64 * f).floor() as i64)
        .collect(),
    )
  }

  /// Check that every component of `self` is a multiple of `other`.
  pub fn is_multiple_of(&self, other: &Coordinate) -> bool {
    self.dims() == other.dims()
      && self
        .iter()
        .zip(other.iter())
        .all(|(a, b)| b != 0 && a.rem_euclid(b) == 0)
  }

  fn zip_with(&self, other: &Coordinate, f: impl Fn(i64, i64) -> i64) -> Coordinate {
    debug_assert_eq!(
      self.dims(),
      other.dims(),
      "coordinate dimensions must match"
    );
    Self(self.iter().zip(other.iter()).map(|(a, b)| f(a, b)).collect())
  }
}

impl Index<usize> for Coordinate {
  type Output = i64;

  fn index(&self, axis: usize) -> &i64 {
    &self.0[axis]
  }
}

impl<const N: usize> From<[i64; N]> for Coordinate {
  fn from(values: [i64; N]) -> Self {
    Self::new(values)
  }
}

impl From<Vec<i64>> for Coordinate {
  fn from(values: Vec<i64>) -> Self {
    Self::new(values)
  }
}

impl From<&[i64]> for Coordinate {
  fn from(values: &[i64]) -> Self {
    Self::new(values.iter().copied())
  }
}

impl fmt::Debug for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    for (i, v) in self.iter().enumerate() {
      if i > 0 {
        write!(f, ", ")?;
      }
      write!(f, "{v}")?;
    }
    write!(f, ")")
  }
}

// =============================================================================
// Element-wise arithmetic
// =============================================================================

impl Add for &Coordinate {
  type Output = Coordinate;

  fn add(self, rhs: &Coordinate) -> Coordinate {
    self.zip_with(rhs, |a, b| a + b)
  }
}

impl Add for Coordinate {
  type Output = Coordinate;

  fn add(self, rhs: Coordinate) -> Coordinate {
    &self + &rhs
  }
}

impl Sub for &Coordinate {
  type Output = Coordinate;

  fn sub(self, rhs: &Coordinate) -> Coordinate {
    self.zip_with(rhs, |a, b| a - b)
  }
}

impl Sub for Coordinate {
  type Output = Coordinate;

  fn sub(self, rhs: Coordinate) -> Coordinate {
    &self - &rhs
  }
}

impl Mul<&Coordinate> for &Coordinate {
  type Output = Coordinate;

  fn mul(self, rhs: &Coordinate) -> Coordinate {
    self.zip_with(rhs, |a, b| a * b)
  }
}

impl Mul<i64> for &Coordinate {
  type Output = Coordinate;

  fn mul(self, rhs: i64) -> Coordinate {
    Coordinate(self.iter().map(|v| v * rhs).collect())
  }
}

impl Mul<i64> for Coordinate {
  type Output = Coordinate;

  fn mul(self, rhs: i64) -> Coordinate {
    &self * rhs
  }
}

/// Floor division per axis.
impl Div<&Coordinate> for &Coordinate {
  type Output = Coordinate;

  fn div(self, rhs: &Coordinate) -> Coordinate {
    self.zip_with(rhs, i64::div_euclid)
  }
}

impl Neg for &Coordinate {
  type Output = Coordinate;

  fn neg(self) -> Coordinate {
    Coordinate(self.iter().map(|v| -v).collect())
  }
}

impl Neg for Coordinate {
  type Output = Coordinate;

  fn neg(self) -> Coordinate {
    -&self
  }
}

#[cfg(test)]
#[path = "coordinate_test.rs"]
mod coordinate_test;
