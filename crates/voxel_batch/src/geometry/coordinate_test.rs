use super::*;

#[test]
fn test_elementwise_add_sub() {
  let a = Coordinate::from([1, 2, 3]);
  let b = Coordinate::from([10, 20, 30]);

  assert_eq!(&a + &b, Coordinate::from([11, 22, 33]));
  assert_eq!(&b - &a, Coordinate::from([9, 18, 27]));
}

#[test]
fn test_scalar_and_elementwise_mul() {
  let a = Coordinate::from([1, -2, 3]);

  assert_eq!(&a * 2, Coordinate::from([2, -4, 6]));
  assert_eq!(&a * &Coordinate::from([2, 2, 0]), Coordinate::from([2, -4, 0]));
}

#[test]
fn test_floor_division() {
  let a = Coordinate::from([7, -7, 8]);
  let b = Coordinate::from([2, 2, 4]);

  assert_eq!(&a / &b, Coordinate::from([3, -4, 2]));
}

#[test]
fn test_neg() {
  assert_eq!(-Coordinate::from([1, 0, -4]), Coordinate::from([-1, 0, 4]));
}

#[test]
fn test_scale_floor() {
  let shape = Coordinate::from([100, 10, 7]);

  // 7 * 0.5 = 3.5 floors to 3
  assert_eq!(shape.scale_floor(&[0.1, 0.25, 0.5]), Coordinate::from([10, 2, 3]));
}

#[test]
fn test_comparisons() {
  let a = Coordinate::from([1, 2, 3]);
  let b = Coordinate::from([1, 5, 4]);

  assert!(a.all_le(&b));
  assert!(b.all_ge(&a));
  assert!(!b.all_le(&a));

  // Differing dimensionality never compares as ordered
  assert!(!a.all_le(&Coordinate::from([9, 9])));
}

#[test]
fn test_is_multiple_of() {
  let voxel_size = Coordinate::from([4, 2, 2]);

  assert!(Coordinate::from([8, -2, 0]).is_multiple_of(&voxel_size));
  assert!(!Coordinate::from([6, 2, 2]).is_multiple_of(&voxel_size));
  assert!(!Coordinate::from([0, 0, 0]).is_multiple_of(&Coordinate::from([0, 1, 1])));
}

#[test]
fn test_display() {
  assert_eq!(Coordinate::from([1, -2, 3]).to_string(), "(1, -2, 3)");
  assert_eq!(Coordinate::zeros(0).to_string(), "()");
}

#[test]
fn test_splat_and_product() {
  let c = Coordinate::splat(3, 4);
  assert_eq!(c.dims(), 4);
  assert_eq!(c.product(), 81);
}
