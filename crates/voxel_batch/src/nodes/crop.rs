//! Crop - shrink the ROI published for one key.
//!
//! ```text
//!   upstream ROI
//!   ┌───────────────────────────────┐
//!   │   negative margin             │
//!   │   ┌───────────────────┐       │
//!   │   │  published ROI    │ pos.  │
//!   │   │                   │ margin│
//!   │   └───────────────────┘       │
//!   └───────────────────────────────┘
//! ```
//!
//! A pure spec transformer: downstream can only request inside the published
//! ROI, so no data is touched at execution time.

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::geometry::{Coordinate, Roi};
use crate::pipeline::{BatchFilter, SetupContext};
use crate::types::ArrayKey;

const STAGE: &str = "Crop";

/// How the published ROI is derived from the upstream ROI.
#[derive(Clone, Debug, PartialEq)]
pub enum CropMode {
  /// Crop to an explicit ROI, which must lie inside the upstream ROI.
  Roi(Roi),

  /// Remove a fraction of the upstream extent from each face.
  Fraction { negative: Vec<f64>, positive: Vec<f64> },

  /// Remove a fixed number of world units from each face.
  Absolute {
    negative: Coordinate,
    positive: Coordinate,
  },
}

/// Limits the ROI provided for `key`.
#[derive(Clone, Debug)]
pub struct Crop {
  key: ArrayKey,
  mode: CropMode,
}

impl Crop {
  /// Start configuring a crop of `key`. Exactly one of the ROI, fraction or
  /// absolute options has to be set before [`CropBuilder::build`].
  pub fn builder(key: ArrayKey) -> CropBuilder {
    CropBuilder {
      key,
      roi: None,
      fraction_negative: None,
      fraction_positive: None,
      abs_negative: None,
      abs_positive: None,
    }
  }

  pub fn key(&self) -> &ArrayKey {
    &self.key
  }

  pub fn mode(&self) -> &CropMode {
    &self.mode
  }

  /// ROI published for an upstream ROI.
  pub fn cropped_roi(&self, upstream: &Roi) -> PipelineResult<Roi> {
    let (negative, positive) = match &self.mode {
      CropMode::Roi(roi) => {
        if !upstream.contains(roi) {
          return Err(PipelineError::config(
            STAGE,
            format!("crop ROI {roi} is not contained in upstream ROI {upstream}"),
          ));
        }
        return Ok(roi.clone());
      }

      CropMode::Fraction { negative, positive } => {
        check_dims(upstream, negative.len())?;
        for (axis, (n, p)) in negative.iter().zip(positive).enumerate() {
          if n + p >= 1.0 {
            return Err(PipelineError::config(
              STAGE,
              format!("sum of crop fractions exceeds 1 on axis {axis} ({n} + {p})"),
            ));
          }
        }
        (
          upstream.shape().scale_floor(negative),
          upstream.shape().scale_floor(positive),
        )
      }

      CropMode::Absolute { negative, positive } => {
        check_dims(upstream, negative.dims())?;
        (negative.clone(), positive.clone())
      }
    };

    let fits = negative
      .iter()
      .zip(positive.iter())
      .zip(upstream.shape().iter())
      .all(|((n, p), s)| n.checked_add(p).is_some_and(|t| t < s));
    if !fits {
      return Err(PipelineError::config(
        STAGE,
        format!(
          "combination of requested negative crop ({negative}) and positive crop ({positive}) \
           is larger than the provided ROI shape ({})",
          upstream.shape()
        ),
      ));
    }

    Ok(upstream.grow(&-&negative, &-&positive))
  }
}

fn check_dims(upstream: &Roi, dims: usize) -> PipelineResult<()> {
  if upstream.dims() != dims {
    return Err(PipelineError::DimensionMismatch {
      expected: upstream.dims(),
      found: dims,
    });
  }
  Ok(())
}

impl BatchFilter for Crop {
  fn name(&self) -> &str {
    STAGE
  }

  fn setup(&mut self, ctx: &mut SetupContext<'_>) -> PipelineResult<()> {
    let mut spec = ctx.upstream(&self.key)?.clone();
    let Some(upstream_roi) = spec.roi.take() else {
      return Err(PipelineError::config(
        STAGE,
        format!("{} has no ROI to crop", self.key),
      ));
    };

    let cropped = self.cropped_roi(&upstream_roi)?;
    debug!(key = %self.key, %upstream_roi, %cropped, "cropping provided ROI");

    spec.roi = Some(cropped);
    ctx.updates(self.key.clone(), spec)
  }
}

// =============================================================================
// Builder
// =============================================================================

/// Collects crop options; [`build`](Self::build) checks they are consistent.
#[derive(Clone, Debug)]
pub struct CropBuilder {
  key: ArrayKey,
  roi: Option<Roi>,
  fraction_negative: Option<Vec<f64>>,
  fraction_positive: Option<Vec<f64>>,
  abs_negative: Option<Coordinate>,
  abs_positive: Option<Coordinate>,
}

impl CropBuilder {
  /// The ROI to crop to.
  pub fn with_roi(mut self, roi: Roi) -> Self {
    self.roi = Some(roi);
    self
  }

  /// Relative crop from the negative end of the upstream ROI, per axis.
  pub fn with_fraction_negative(mut self, fractions: impl Into<Vec<f64>>) -> Self {
    self.fraction_negative = Some(fractions.into());
    self
  }

  /// Relative crop from the positive end of the upstream ROI, per axis.
  pub fn with_fraction_positive(mut self, fractions: impl Into<Vec<f64>>) -> Self {
    self.fraction_positive = Some(fractions.into());
    self
  }

  /// World units to crop from the negative end of the upstream ROI.
  pub fn with_abs_negative(mut self, amount: impl Into<Coordinate>) -> Self {
    self.abs_negative = Some(amount.into());
    self
  }

  /// World units to crop from the positive end of the upstream ROI.
  pub fn with_abs_positive(mut self, amount: impl Into<Coordinate>) -> Self {
    self.abs_positive = Some(amount.into());
    self
  }

  pub fn build(self) -> PipelineResult<Crop> {
    let has_fraction = self.fraction_negative.is_some() || self.fraction_positive.is_some();
    let has_abs = self.abs_negative.is_some() || self.abs_positive.is_some();

    let mode = match (self.roi, has_fraction, has_abs) {
      (Some(_), true, _) | (Some(_), _, true) => {
        return Err(PipelineError::config(
          STAGE,
          "'roi' and 'fraction_...'/'abs_...' arguments can not be given together",
        ));
      }
      (None, true, true) => {
        return Err(PipelineError::config(
          STAGE,
          "'fraction_...' and 'abs_...' arguments can not be given together",
        ));
      }
      (None, false, false) => {
        return Err(PipelineError::config(
          STAGE,
          "one of 'roi', 'fraction_...', or 'abs_...' has to be given",
        ));
      }
      (Some(roi), false, false) => CropMode::Roi(roi),
      (None, true, false) => {
        let (negative, positive) =
          fill_missing_face(self.fraction_negative, self.fraction_positive, |n| vec![0.0; n], Vec::len);
        check_face_dims(negative.len(), positive.len())?;
        if let Some(f) = negative
          .iter()
          .chain(&positive)
          .find(|f| !(0.0..1.0).contains(*f))
        {
          return Err(PipelineError::config(
            STAGE,
            format!("crop fractions must lie in [0, 1), got {f}"),
          ));
        }
        CropMode::Fraction { negative, positive }
      }
      (None, false, true) => {
        let (negative, positive) =
          fill_missing_face(self.abs_negative, self.abs_positive, Coordinate::zeros, Coordinate::dims);
        check_face_dims(negative.dims(), positive.dims())?;
        if !negative.is_non_negative() || !positive.is_non_negative() {
          return Err(PipelineError::config(
            STAGE,
            format!("crop amounts must not be negative, got {negative} and {positive}"),
          ));
        }
        CropMode::Absolute { negative, positive }
      }
    };

    Ok(Crop {
      key: self.key,
      mode,
    })
  }
}

/// Default the face that was not given to zero margin on every axis.
fn fill_missing_face<T>(
  negative: Option<T>,
  positive: Option<T>,
  zeros: impl Fn(usize) -> T,
  dims: impl Fn(&T) -> usize,
) -> (T, T) {
  match (negative, positive) {
    (Some(n), Some(p)) => (n, p),
    (Some(n), None) => {
      let p = zeros(dims(&n));
      (n, p)
    }
    (None, Some(p)) => (zeros(dims(&p)), p),
    (None, None) => (zeros(0), zeros(0)),
  }
}

fn check_face_dims(negative: usize, positive: usize) -> PipelineResult<()> {
  if negative != positive {
    return Err(PipelineError::config(
      STAGE,
      format!("negative ({negative}) and positive ({positive}) crop have different dimensions"),
    ));
  }
  Ok(())
}

#[cfg(test)]
#[path = "crop_test.rs"]
mod crop_test;
