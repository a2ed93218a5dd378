//! Core value types: array keys, element types and per-key specs.

use std::fmt;
use std::sync::Arc;

use crate::geometry::{Coordinate, Roi};

/// Name of an array flowing through the pipeline (e.g. `RAW`, `GT_LABELS`).
///
/// Cheap to clone; compared and ordered by name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrayKey(Arc<str>);

impl ArrayKey {
  pub fn new(name: &str) -> Self {
    Self(Arc::from(name))
  }

  pub fn name(&self) -> &str {
    &self.0
  }
}

impl From<&str> for ArrayKey {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

impl fmt::Debug for ArrayKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ArrayKey({})", self.0)
  }
}

impl fmt::Display for ArrayKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Element type of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
  U8,
  U16,
  U32,
  U64,
  I8,
  I16,
  I32,
  I64,
  F32,
  F64,
}

impl DataType {
  /// Size of one element in bytes.
  pub fn size_of(self) -> usize {
    match self {
      DataType::U8 | DataType::I8 => 1,
      DataType::U16 | DataType::I16 => 2,
      DataType::U32 | DataType::I32 | DataType::F32 => 4,
      DataType::U64 | DataType::I64 | DataType::F64 => 8,
    }
  }

  pub fn is_float(self) -> bool {
    matches!(self, DataType::F32 | DataType::F64)
  }
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      DataType::U8 => "uint8",
      DataType::U16 => "uint16",
      DataType::U32 => "uint32",
      DataType::U64 => "uint64",
      DataType::I8 => "int8",
      DataType::I16 => "int16",
      DataType::I32 => "int32",
      DataType::I64 => "int64",
      DataType::F32 => "float32",
      DataType::F64 => "float64",
    };
    f.write_str(name)
  }
}

/// Description of what a stage provides (or a request asks for) for one key.
///
/// `None` fields are unconstrained: a request with `dtype: None` accepts any
/// element type, a spec with `roi: None` is not spatially bounded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArraySpec {
  /// Region in world units.
  pub roi: Option<Roi>,

  /// World units per voxel along each axis.
  pub voxel_size: Option<Coordinate>,

  /// Element type.
  pub dtype: Option<DataType>,

  /// Whether values can be interpolated (intensities yes, labels no).
  pub interpolatable: Option<bool>,
}

impl ArraySpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_roi(mut self, roi: Roi) -> Self {
    self.roi = Some(roi);
    self
  }

  pub fn with_voxel_size(mut self, voxel_size: impl Into<Coordinate>) -> Self {
    self.voxel_size = Some(voxel_size.into());
    self
  }

  pub fn with_dtype(mut self, dtype: DataType) -> Self {
    self.dtype = Some(dtype);
    self
  }

  pub fn with_interpolatable(mut self, interpolatable: bool) -> Self {
    self.interpolatable = Some(interpolatable);
    self
  }

  /// Voxel size, defaulting to one world unit per voxel.
  pub fn voxel_size_or_unit(&self, dims: usize) -> Coordinate {
    self
      .voxel_size
      .clone()
      .unwrap_or_else(|| Coordinate::splat(1, dims))
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
