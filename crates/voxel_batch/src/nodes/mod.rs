//! Pipeline stages.
//!
//! | stage            | kind      | effect                                    |
//! |------------------|-----------|-------------------------------------------|
//! | [`Crop`]         | filter    | shrinks the published ROI of one key      |
//! | [`Normalize`]    | filter    | scales values into `[0, 1]`               |
//! | [`NormalizeTo`]  | filter    | maps values onto a target interval        |
//! | [`RejectConstant`] | providing | retries until the data is not constant  |

pub mod crop;
pub mod normalize;
pub mod normalize_to;
pub mod reject_constant;

pub use crop::{Crop, CropBuilder, CropMode};
pub use normalize::Normalize;
pub use normalize_to::NormalizeTo;
pub use reject_constant::RejectConstant;
