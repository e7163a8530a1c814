//! Construction parameters for the three tree flavours.

use thiserror::Error;

use crate::bounds::Bounds;

/// Deepest level a tree may subdivide to.
pub const MAX_DEPTH: u8 = 8;

/// Most resolution levels a skip tree may hold.
pub const MAX_LEVELS: usize = 8;

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
  #[error("max_leaf_objects must be greater than zero")]
  ZeroLeafObjects,
  #[error("initial_objects_capacity must be greater than zero")]
  ZeroCapacity,
  #[error("root bounds must have a positive, finite volume")]
  DegenerateBounds,
  #[error("levels must be within 1..={max}, got {0}", max = MAX_LEVELS)]
  LevelsOutOfRange(usize),
  #[error("promotion probability must be within (0, 1), got {0}")]
  InvalidProbability(f64),
}

/// Configuration shared by every tree flavour.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig<B> {
  /// Root bounds; objects must intersect them to be stored.
  pub bounds: B,

  /// Objects a leaf holds before it splits.
  pub max_leaf_objects: usize,

  /// Deepest split level. Values above [`MAX_DEPTH`] are clamped; 0 keeps
  /// everything in the root.
  pub max_depth: u8,

  /// Object slots reserved up front.
  pub initial_objects_capacity: usize,
}

impl<B: Bounds> TreeConfig<B> {
  /// Configuration with default limits (8 objects per leaf, depth 8).
  pub fn new(bounds: B) -> Self {
    Self {
      bounds,
      max_leaf_objects: 8,
      max_depth: MAX_DEPTH,
      initial_objects_capacity: 64,
    }
  }

  pub fn with_max_leaf_objects(mut self, max_leaf_objects: usize) -> Self {
    self.max_leaf_objects = max_leaf_objects;
    self
  }

  pub fn with_max_depth(mut self, max_depth: u8) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn with_initial_capacity(mut self, initial_objects_capacity: usize) -> Self {
    self.initial_objects_capacity = initial_objects_capacity;
    self
  }

  /// Depth limit actually applied.
  #[inline]
  pub fn effective_max_depth(&self) -> u8 {
    self.max_depth.min(MAX_DEPTH)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.max_leaf_objects == 0 {
      return Err(ConfigError::ZeroLeafObjects);
    }
    if self.initial_objects_capacity == 0 {
      return Err(ConfigError::ZeroCapacity);
    }
    let volume = self.bounds.volume();
    if !(volume.is_finite() && volume > 0.0) {
      return Err(ConfigError::DegenerateBounds);
    }
    Ok(())
  }
}

/// Skip tree configuration: one [`TreeConfig`] applied to every level.
#[derive(Clone, Debug, PartialEq)]
pub struct SkipTreeConfig<B> {
  pub tree: TreeConfig<B>,

  /// Number of resolution levels, 1..=[`MAX_LEVELS`].
  pub levels: usize,

  /// Chance that an object present at level `i` is also stored at `i + 1`.
  pub promotion_probability: f64,

  /// Seed for the promotion coin flips; `None` draws from OS entropy.
  pub seed: Option<u64>,
}

impl<B: Bounds> SkipTreeConfig<B> {
  /// Four levels, fair coin, unseeded.
  pub fn new(tree: TreeConfig<B>) -> Self {
    Self {
      tree,
      levels: 4,
      promotion_probability: 0.5,
      seed: None,
    }
  }

  pub fn with_levels(mut self, levels: usize) -> Self {
    self.levels = levels;
    self
  }

  pub fn with_promotion_probability(mut self, probability: f64) -> Self {
    self.promotion_probability = probability;
    self
  }

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    self.tree.validate()?;
    if !(1..=MAX_LEVELS).contains(&self.levels) {
      return Err(ConfigError::LevelsOutOfRange(self.levels));
    }
    let p = self.promotion_probability;
    if !(p > 0.0 && p < 1.0) {
      return Err(ConfigError::InvalidProbability(p));
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
