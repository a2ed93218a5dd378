//! Per-stage timing collected on every batch.
//!
//! # Usage
//!
//! ```ignore
//! use voxel_batch::profiling::Timing;
//!
//! let mut timing = Timing::new("RejectConstant", "provide");
//! timing.start();
//! // ... work ...
//! timing.stop();
//! batch.profiling_stats.add(&timing);
//! ```
//!
//! Stats travel with the batch from the source downstream; every stage adds
//! its own timings on the way and never removes any.

use std::collections::BTreeMap;
use std::time::Duration;

use web_time::Instant;

/// Start/stop stopwatch attributed to a stage and phase.
#[derive(Debug, Clone)]
pub struct Timing {
  stage: String,
  phase: &'static str,
  started: Option<Instant>,
  accumulated: Duration,
}

impl Timing {
  pub fn new(stage: impl Into<String>, phase: &'static str) -> Self {
    Self {
      stage: stage.into(),
      phase,
      started: None,
      accumulated: Duration::ZERO,
    }
  }

  /// Start (or resume) the stopwatch.
  pub fn start(&mut self) {
    if self.started.is_none() {
      self.started = Some(Instant::now());
    }
  }

  /// Stop the stopwatch, keeping the time measured so far.
  pub fn stop(&mut self) {
    if let Some(started) = self.started.take() {
      self.accumulated += started.elapsed();
    }
  }

  /// Time measured so far, including a still-running interval.
  pub fn elapsed(&self) -> Duration {
    match self.started {
      Some(started) => self.accumulated + started.elapsed(),
      None => self.accumulated,
    }
  }

  pub fn stage(&self) -> &str {
    &self.stage
  }

  pub fn phase(&self) -> &'static str {
    self.phase
  }
}

/// Running summary of the timings recorded for one stage and phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSummary {
  pub count: u32,
  pub total: Duration,
  pub min: Duration,
  pub max: Duration,
}

impl TimingSummary {
  fn from_elapsed(elapsed: Duration) -> Self {
    Self {
      count: 1,
      total: elapsed,
      min: elapsed,
      max: elapsed,
    }
  }

  fn merge(&mut self, other: &TimingSummary) {
    self.count += other.count;
    self.total += other.total;
    self.min = self.min.min(other.min);
    self.max = self.max.max(other.max);
  }

  /// Average duration per recorded timing.
  pub fn mean(&self) -> Duration {
    if self.count == 0 {
      Duration::ZERO
    } else {
      self.total / self.count
    }
  }
}

/// Timing summaries keyed by `(stage, phase)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilingStats {
  summaries: BTreeMap<(String, &'static str), TimingSummary>,
}

impl ProfilingStats {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a finished (or running) timing.
  pub fn add(&mut self, timing: &Timing) {
    let summary = TimingSummary::from_elapsed(timing.elapsed());
    self
      .summaries
      .entry((timing.stage.clone(), timing.phase))
      .and_modify(|s| s.merge(&summary))
      .or_insert(summary);
  }

  pub fn get(&self, stage: &str, phase: &str) -> Option<&TimingSummary> {
    self
      .summaries
      .iter()
      .find(|((s, p), _)| s == stage && *p == phase)
      .map(|(_, summary)| summary)
  }

  pub fn len(&self) -> usize {
    self.summaries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.summaries.is_empty()
  }

  /// Iterate `(stage, phase, summary)` in stage order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &'static str, &TimingSummary)> {
    self
      .summaries
      .iter()
      .map(|((stage, phase), summary)| (stage.as_str(), *phase, summary))
  }
}

#[cfg(test)]
#[path = "profiling_test.rs"]
mod profiling_test;
