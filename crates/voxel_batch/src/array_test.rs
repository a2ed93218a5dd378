use ndarray::{arr1, Array2, Array3, ArrayD, IxDyn};

use super::*;
use crate::geometry::Roi;

fn key() -> ArrayKey {
  ArrayKey::new("RAW")
}

#[test]
fn test_dtype_from_variant() {
  let data: ArrayData = Array2::<u16>::zeros((2, 2)).into();
  assert_eq!(data.dtype(), DataType::U16);
  assert_eq!(data.shape(), &[2, 2]);
  assert_eq!(data.len(), 4);
}

#[test]
fn test_as_array_checks_type() {
  let data: ArrayData = arr1(&[1.0f32, 2.0]).into();

  assert!(data.as_array::<f32>().is_some());
  assert!(data.as_array::<u8>().is_none());
}

#[test]
fn test_cast_saturates() {
  let values = ArrayD::from_shape_vec(IxDyn(&[3]), vec![-5.0, 127.9, 300.0]).unwrap();
  let data = ArrayData::from_f64(&values, DataType::U8);

  let out = data.as_array::<u8>().unwrap();
  assert_eq!(out.as_slice().unwrap(), &[0, 127, 255]);
}

#[test]
fn test_min_max() {
  let data: ArrayData = arr1(&[3i16, -2, 7, 0]).into();
  assert_eq!(data.min_max(), Some((-2.0, 7.0)));

  let empty: ArrayData = Array2::<u8>::zeros((0, 3)).into();
  assert_eq!(empty.min_max(), None);
}

#[test]
fn test_new_sets_dtype() {
  let array = Array::new(Array2::<u8>::zeros((2, 2)), ArraySpec::new().with_dtype(DataType::F32));
  assert_eq!(array.spec.dtype, Some(DataType::U8));
}

#[test]
fn test_check_shape_with_voxel_size() {
  let spec = ArraySpec::new()
    .with_roi(Roi::new([0, 0], [8, 4]))
    .with_voxel_size([2, 2]);

  let good = Array::new(Array2::<u8>::zeros((4, 2)), spec.clone());
  assert!(good.check_shape(&key()).is_ok());

  let bad = Array::new(Array2::<u8>::zeros((8, 4)), spec);
  assert!(matches!(bad.check_shape(&key()), Err(PipelineError::Shape { .. })));
}

#[test]
fn test_check_shape_allows_channel_axes() {
  let spec = ArraySpec::new().with_roi(Roi::new([0, 0], [3, 4]));
  let array = Array::new(Array3::<f32>::zeros((2, 3, 4)), spec);

  assert!(array.check_shape(&key()).is_ok());
}

#[test]
fn test_crop_copies_sub_block() {
  let data = Array2::from_shape_fn((4, 4), |(y, x)| (y * 4 + x) as u8);
  let array = Array::new(data, ArraySpec::new().with_roi(Roi::new([10, 10], [4, 4])));

  let cropped = array.crop(&key(), &Roi::new([11, 12], [2, 2])).unwrap();

  assert_eq!(cropped.spec.roi, Some(Roi::new([11, 12], [2, 2])));
  let out = cropped.data.as_array::<u8>().unwrap();
  assert_eq!(out.shape(), &[2, 2]);
  assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![6, 7, 10, 11]);
}

#[test]
fn test_crop_respects_voxel_size() {
  let data = Array2::from_shape_fn((4, 4), |(y, x)| (y * 4 + x) as u8);
  let spec = ArraySpec::new()
    .with_roi(Roi::new([0, 0], [8, 8]))
    .with_voxel_size([2, 2]);
  let array = Array::new(data, spec);

  let cropped = array.crop(&key(), &Roi::new([2, 4], [4, 2])).unwrap();
  let out = cropped.data.as_array::<u8>().unwrap();
  assert_eq!(out.shape(), &[2, 1]);
  assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![6, 10]);

  // Unaligned requests are refused
  assert!(matches!(
    array.crop(&key(), &Roi::new([1, 0], [2, 2])),
    Err(PipelineError::Shape { .. })
  ));
}

#[test]
fn test_crop_outside_fails() {
  let array = Array::new(Array2::<u8>::zeros((4, 4)), ArraySpec::new().with_roi(Roi::new([0, 0], [4, 4])));

  let err = array.crop(&key(), &Roi::new([2, 2], [4, 4])).unwrap_err();
  assert!(matches!(err, PipelineError::RequestOutsideSpec { .. }));
}
