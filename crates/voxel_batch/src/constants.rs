//! Defaults shared by the pipeline stages.

use std::time::Duration;

/// Default minimum coefficient of variation a batch must exceed to be kept.
pub const DEFAULT_MIN_COEFVAR: f64 = 1e-4;

/// Floor for `|mean|` when computing the coefficient of variation.
pub const COEFVAR_EPSILON: f64 = 1e-10;

/// Default probability that an invalid batch is actually rejected.
pub const DEFAULT_REJECT_PROBABILITY: f64 = 1.0;

/// Default axis the coefficient of variation is aggregated over.
pub const DEFAULT_COEFVAR_AXIS: usize = 1;

/// Waiting time after which the rejection loop first warns. Doubles after
/// each warning.
pub const INITIAL_REPORT_AFTER: Duration = Duration::from_secs(10);

/// Scale implied by 8-bit unsigned input (`[0, 255]`).
pub const U8_MAX: f64 = u8::MAX as f64;

/// Scale implied by 16-bit unsigned input (`[0, 65535]`).
pub const U16_MAX: f64 = u16::MAX as f64;
