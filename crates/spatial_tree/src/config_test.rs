use glam::Vec2;

use super::*;
use crate::bounds::Aabb2;

fn world() -> Aabb2 {
  Aabb2::new(Vec2::ZERO, Vec2::splat(64.0))
}

#[test]
fn test_defaults_are_valid() {
  let config = TreeConfig::new(world());
  assert_eq!(config.max_leaf_objects, 8);
  assert_eq!(config.max_depth, MAX_DEPTH);
  assert_eq!(config.validate(), Ok(()));

  let skip = SkipTreeConfig::new(config);
  assert_eq!(skip.levels, 4);
  assert_eq!(skip.promotion_probability, 0.5);
  assert_eq!(skip.validate(), Ok(()));
}

#[test]
fn test_zero_leaf_objects_rejected() {
  let config = TreeConfig::new(world()).with_max_leaf_objects(0);
  assert_eq!(config.validate(), Err(ConfigError::ZeroLeafObjects));
}

#[test]
fn test_zero_capacity_rejected() {
  let config = TreeConfig::new(world()).with_initial_capacity(0);
  assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
}

#[test]
fn test_flat_bounds_rejected() {
  let flat = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 0.0));
  assert_eq!(
    TreeConfig::new(flat).validate(),
    Err(ConfigError::DegenerateBounds)
  );
}

/// Depth above the hard cap is clamped, not rejected.
#[test]
fn test_max_depth_is_clamped() {
  let config = TreeConfig::new(world()).with_max_depth(20);
  assert_eq!(config.validate(), Ok(()));
  assert_eq!(config.effective_max_depth(), MAX_DEPTH);

  let shallow = TreeConfig::new(world()).with_max_depth(0);
  assert_eq!(shallow.effective_max_depth(), 0);
}

#[test]
fn test_levels_range() {
  let tree = TreeConfig::new(world());
  assert_eq!(
    SkipTreeConfig::new(tree.clone()).with_levels(0).validate(),
    Err(ConfigError::LevelsOutOfRange(0))
  );
  assert_eq!(
    SkipTreeConfig::new(tree.clone()).with_levels(9).validate(),
    Err(ConfigError::LevelsOutOfRange(9))
  );
  assert_eq!(SkipTreeConfig::new(tree).with_levels(8).validate(), Ok(()));
}

#[test]
fn test_probability_range() {
  let tree = TreeConfig::new(world());
  for p in [0.0, 1.0, -0.5, f64::NAN] {
    let result = SkipTreeConfig::new(tree.clone())
      .with_promotion_probability(p)
      .validate();
    assert!(
      matches!(result, Err(ConfigError::InvalidProbability(_))),
      "Probability {p} should be rejected"
    );
  }
}

#[test]
fn test_error_messages() {
  assert_eq!(
    ConfigError::LevelsOutOfRange(12).to_string(),
    "levels must be within 1..=8, got 12"
  );
  assert_eq!(
    ConfigError::ZeroLeafObjects.to_string(),
    "max_leaf_objects must be greater than zero"
  );
}
