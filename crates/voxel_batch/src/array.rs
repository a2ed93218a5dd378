//! Materialized array data and its element-type dispatch.
//!
//! `ArrayData` is a closed enum over the supported element types, each
//! variant holding a dynamic-dimensional `ndarray`. Numeric transforms convert
//! to `f64`, compute, and cast back with [`ArrayData::from_f64`].

use ndarray::{Array as NdArray, ArrayD, Dimension, Slice};

use crate::error::{PipelineError, PipelineResult};
use crate::geometry::Roi;
use crate::types::{ArrayKey, ArraySpec, DataType};

/// Typed n-dimensional buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
  U8(ArrayD<u8>),
  U16(ArrayD<u16>),
  U32(ArrayD<u32>),
  U64(ArrayD<u64>),
  I8(ArrayD<i8>),
  I16(ArrayD<i16>),
  I32(ArrayD<i32>),
  I64(ArrayD<i64>),
  F32(ArrayD<f32>),
  F64(ArrayD<f64>),
}

/// Run `$body` with `$arr` bound to the inner `ArrayD<T>` of any variant.
macro_rules! with_array {
  ($data:expr, $arr:ident => $body:expr) => {
    match $data {
      ArrayData::U8($arr) => $body,
      ArrayData::U16($arr) => $body,
      ArrayData::U32($arr) => $body,
      ArrayData::U64($arr) => $body,
      ArrayData::I8($arr) => $body,
      ArrayData::I16($arr) => $body,
      ArrayData::I32($arr) => $body,
      ArrayData::I64($arr) => $body,
      ArrayData::F32($arr) => $body,
      ArrayData::F64($arr) => $body,
    }
  };
}

/// Element types that can live in an [`ArrayData`].
pub trait Element: Copy + 'static {
  const DTYPE: DataType;

  /// Borrow the inner array if `data` holds this element type.
  fn unwrap_data(data: &ArrayData) -> Option<&ArrayD<Self>>;

  fn wrap(array: ArrayD<Self>) -> ArrayData;

  fn to_f64(self) -> f64;

  /// Saturating conversion from `f64` (`NaN` maps to zero for integers).
  fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
  ($t:ty, $variant:ident) => {
    impl Element for $t {
      const DTYPE: DataType = DataType::$variant;

      fn unwrap_data(data: &ArrayData) -> Option<&ArrayD<Self>> {
        match data {
          ArrayData::$variant(array) => Some(array),
          _ => None,
        }
      }

      fn wrap(array: ArrayD<Self>) -> ArrayData {
        ArrayData::$variant(array)
      }

      #[inline]
      fn to_f64(self) -> f64 {
        self as f64
      }

      #[inline]
      fn from_f64(value: f64) -> Self {
        value as $t
      }
    }

    impl<D: Dimension> From<NdArray<$t, D>> for ArrayData {
      fn from(array: NdArray<$t, D>) -> Self {
        ArrayData::$variant(array.into_dyn())
      }
    }
  };
}

impl_element!(u8, U8);
impl_element!(u16, U16);
impl_element!(u32, U32);
impl_element!(u64, U64);
impl_element!(i8, I8);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(f32, F32);
impl_element!(f64, F64);

impl ArrayData {
  pub fn dtype(&self) -> DataType {
    match self {
      ArrayData::U8(_) => DataType::U8,
      ArrayData::U16(_) => DataType::U16,
      ArrayData::U32(_) => DataType::U32,
      ArrayData::U64(_) => DataType::U64,
      ArrayData::I8(_) => DataType::I8,
      ArrayData::I16(_) => DataType::I16,
      ArrayData::I32(_) => DataType::I32,
      ArrayData::I64(_) => DataType::I64,
      ArrayData::F32(_) => DataType::F32,
      ArrayData::F64(_) => DataType::F64,
    }
  }

  pub fn shape(&self) -> &[usize] {
    with_array!(self, a => a.shape())
  }

  pub fn ndim(&self) -> usize {
    with_array!(self, a => a.ndim())
  }

  pub fn len(&self) -> usize {
    with_array!(self, a => a.len())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Typed view of the data, `None` if the element type differs.
  pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
    T::unwrap_data(self)
  }

  /// All values converted to `f64`.
  pub fn to_f64(&self) -> ArrayD<f64> {
    with_array!(self, a => a.mapv(Element::to_f64))
  }

  /// Cast `f64` values into an array of element type `dtype`.
  pub fn from_f64(values: &ArrayD<f64>, dtype: DataType) -> ArrayData {
    fn cast<T: Element>(values: &ArrayD<f64>) -> ArrayData {
      T::wrap(values.mapv(T::from_f64))
    }

    match dtype {
      DataType::U8 => cast::<u8>(values),
      DataType::U16 => cast::<u16>(values),
      DataType::U32 => cast::<u32>(values),
      DataType::U64 => cast::<u64>(values),
      DataType::I8 => cast::<i8>(values),
      DataType::I16 => cast::<i16>(values),
      DataType::I32 => cast::<i32>(values),
      DataType::I64 => cast::<i64>(values),
      DataType::F32 => cast::<f32>(values),
      DataType::F64 => values.clone().into(),
    }
  }

  /// Minimum and maximum value, `None` for empty arrays.
  pub fn min_max(&self) -> Option<(f64, f64)> {
    with_array!(self, a => min_max(a.iter().map(|&v| v.to_f64())))
  }

  /// Copy of the sub-block `[begin[i], begin[i] + shape[i])` along the
  /// trailing axes; leading (channel) axes are kept whole.
  pub fn slice_trailing(&self, begin: &[usize], shape: &[usize]) -> ArrayData {
    let leading = self.ndim() - begin.len();
    with_array!(self, a => {
      let view = a.slice_each_axis(|axis| {
        let i = axis.axis.index();
        if i < leading {
          Slice::from(..)
        } else {
          let j = i - leading;
          Slice::from(begin[j]..begin[j] + shape[j])
        }
      });
      view.to_owned().into()
    })
  }
}

/// Min/max over `f64` values. A NaN anywhere makes both results NaN.
pub(crate) fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
  values.fold(None, |acc, v| match acc {
    None => Some((v, v)),
    Some((lo, hi)) => Some((
      if v < lo || v.is_nan() { v } else { lo },
      if v > hi || v.is_nan() { v } else { hi },
    )),
  })
}

/// Array data together with the spec it was produced under.
#[derive(Clone, Debug, PartialEq)]
pub struct Array {
  pub data: ArrayData,
  pub spec: ArraySpec,
}

impl Array {
  /// Wrap data with a spec. The spec's `dtype` is set from the data.
  pub fn new(data: impl Into<ArrayData>, spec: ArraySpec) -> Self {
    let data = data.into();
    let spec = ArraySpec {
      dtype: Some(data.dtype()),
      ..spec
    };
    Self { data, spec }
  }

  /// Number of voxels along each spatial axis implied by the spec's ROI.
  fn voxel_shape(&self, key: &ArrayKey, roi: &Roi) -> PipelineResult<Vec<usize>> {
    let voxel_size = self.spec.voxel_size_or_unit(roi.dims());
    if voxel_size.dims() != roi.dims() {
      return Err(PipelineError::DimensionMismatch {
        expected: roi.dims(),
        found: voxel_size.dims(),
      });
    }
    if !roi.shape().is_multiple_of(&voxel_size) || !roi.offset().is_multiple_of(&voxel_size) {
      return Err(PipelineError::Shape {
        key: key.clone(),
        reason: format!("ROI {roi} is not a multiple of voxel size {voxel_size}"),
      });
    }
    Ok((roi.shape() / &voxel_size).iter().map(|v| v as usize).collect())
  }

  /// Check that the trailing data axes match the ROI in voxels.
  pub fn check_shape(&self, key: &ArrayKey) -> PipelineResult<()> {
    let Some(roi) = &self.spec.roi else {
      return Ok(());
    };
    let expected = self.voxel_shape(key, roi)?;
    let shape = self.data.shape();
    if shape.len() < expected.len() || shape[shape.len() - expected.len()..] != expected[..] {
      return Err(PipelineError::Shape {
        key: key.clone(),
        reason: format!(
          "data shape {:?} does not end with {:?} voxels for ROI {}",
          shape, expected, roi
        ),
      });
    }
    Ok(())
  }

  /// Copy out the part of this array covered by `roi` (world units).
  ///
  /// `roi` must be contained in the array's ROI and aligned to its voxel
  /// size.
  pub fn crop(&self, key: &ArrayKey, roi: &Roi) -> PipelineResult<Array> {
    let Some(own_roi) = &self.spec.roi else {
      return Ok(self.clone());
    };
    self.check_shape(key)?;
    if !own_roi.contains(roi) {
      return Err(PipelineError::RequestOutsideSpec {
        key: key.clone(),
        requested: roi.clone(),
        provided: own_roi.clone(),
      });
    }
    let relative = Roi::new(roi.offset() - own_roi.offset(), roi.shape().clone());
    // Checks alignment of both offset and shape
    let shape = self.voxel_shape(key, &relative)?;
    let voxel_size = self.spec.voxel_size_or_unit(roi.dims());
    let begin: Vec<usize> = (relative.offset() / &voxel_size)
      .iter()
      .map(|v| v as usize)
      .collect();

    Ok(Array {
      data: self.data.slice_trailing(&begin, &shape),
      spec: ArraySpec {
        roi: Some(roi.clone()),
        ..self.spec.clone()
      },
    })
  }
}

#[cfg(test)]
#[path = "array_test.rs"]
mod array_test;
