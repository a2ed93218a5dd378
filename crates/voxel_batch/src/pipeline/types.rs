//! Containers flowing through the pipeline.
//!
//! ```text
//!  negotiation (once):        ProviderSpec ──► ProviderSpec ──► ProviderSpec
//!                               (source)         (stage 1)        (stage 2)
//!
//!  execution (per call):      Batch ◄──────── Batch ◄────────── Batch
//!                             BatchRequest ──► BatchRequest ───► BatchRequest
//!                               (source)         (stage 1)        (stage 2) ◄── caller
//! ```

use std::collections::BTreeMap;

use crate::array::Array;
use crate::geometry::Roi;
use crate::profiling::ProfilingStats;
use crate::types::{ArrayKey, ArraySpec};

// =============================================================================
// ProviderSpec - the spec registry of one node
// =============================================================================

/// What a node provides: one [`ArraySpec`] per key.
///
/// Written once while the node negotiates, read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProviderSpec {
  specs: BTreeMap<ArrayKey, ArraySpec>,
}

impl ProviderSpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, key: ArrayKey, spec: ArraySpec) -> Option<ArraySpec> {
    self.specs.insert(key, spec)
  }

  pub fn get(&self, key: &ArrayKey) -> Option<&ArraySpec> {
    self.specs.get(key)
  }

  pub fn contains(&self, key: &ArrayKey) -> bool {
    self.specs.contains_key(key)
  }

  pub fn remove(&mut self, key: &ArrayKey) -> Option<ArraySpec> {
    self.specs.remove(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
    self.specs.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &ArraySpec)> {
    self.specs.iter()
  }

  pub fn len(&self) -> usize {
    self.specs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.specs.is_empty()
  }
}

// =============================================================================
// BatchRequest - what the downstream caller asks for
// =============================================================================

/// Request for a set of arrays, plus the seed any randomized stage must use.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchRequest {
  specs: BTreeMap<ArrayKey, ArraySpec>,
  random_seed: u64,
}

impl Default for BatchRequest {
  fn default() -> Self {
    Self::new()
  }
}

impl BatchRequest {
  /// Empty request with a fresh random seed.
  pub fn new() -> Self {
    Self::with_seed(rand::random())
  }

  /// Empty request with a fixed seed, for reproducible runs.
  pub fn with_seed(random_seed: u64) -> Self {
    Self {
      specs: BTreeMap::new(),
      random_seed,
    }
  }

  /// Request `key` over `roi`, any element type.
  pub fn add(mut self, key: ArrayKey, roi: Roi) -> Self {
    self.specs.insert(key, ArraySpec::new().with_roi(roi));
    self
  }

  pub fn insert(&mut self, key: ArrayKey, spec: ArraySpec) -> Option<ArraySpec> {
    self.specs.insert(key, spec)
  }

  pub fn get(&self, key: &ArrayKey) -> Option<&ArraySpec> {
    self.specs.get(key)
  }

  pub fn get_mut(&mut self, key: &ArrayKey) -> Option<&mut ArraySpec> {
    self.specs.get_mut(key)
  }

  pub fn contains(&self, key: &ArrayKey) -> bool {
    self.specs.contains_key(key)
  }

  pub fn remove(&mut self, key: &ArrayKey) -> Option<ArraySpec> {
    self.specs.remove(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
    self.specs.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &ArraySpec)> {
    self.specs.iter()
  }

  pub fn len(&self) -> usize {
    self.specs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.specs.is_empty()
  }

  pub fn random_seed(&self) -> u64 {
    self.random_seed
  }

  /// Overlay the entries of `other` onto this request (entries in `other`
  /// win). The seed is kept.
  pub fn merge(&mut self, other: BatchRequest) {
    self.specs.extend(other.specs);
  }
}

// =============================================================================
// Batch - materialized result of a request
// =============================================================================

/// Arrays produced for a request, with the timings of the stages they went
/// through.
#[derive(Clone, Debug, Default)]
pub struct Batch {
  arrays: BTreeMap<ArrayKey, Array>,
  pub profiling_stats: ProfilingStats,
}

impl Batch {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, key: ArrayKey, array: Array) -> Option<Array> {
    self.arrays.insert(key, array)
  }

  pub fn get(&self, key: &ArrayKey) -> Option<&Array> {
    self.arrays.get(key)
  }

  pub fn get_mut(&mut self, key: &ArrayKey) -> Option<&mut Array> {
    self.arrays.get_mut(key)
  }

  pub fn remove(&mut self, key: &ArrayKey) -> Option<Array> {
    self.arrays.remove(key)
  }

  pub fn contains(&self, key: &ArrayKey) -> bool {
    self.arrays.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
    self.arrays.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Array)> {
    self.arrays.iter()
  }

  pub fn len(&self) -> usize {
    self.arrays.len()
  }

  pub fn is_empty(&self) -> bool {
    self.arrays.is_empty()
  }

  /// Drop every array whose key is not part of `request`.
  pub fn retain_requested(&mut self, request: &BatchRequest) {
    self.arrays.retain(|key, _| request.contains(key));
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
