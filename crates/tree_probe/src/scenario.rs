//! Scenario file parsing.

use anyhow::{Context, Result};
use glam::Vec2;
use serde::Deserialize;
use spatial_tree::{Aabb2, SkipTreeConfig, TreeConfig};
use std::path::Path;

/// One simulated run. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scenario {
	/// Half-size of the square world (root bounds).
	pub world_half_size: f32,
	/// Objects spawned at start.
	pub objects: usize,
	/// Half-size of every object's box.
	pub object_half_size: f32,
	/// Maximum distance an object moves per tick.
	pub speed: f32,
	/// Objects may wander this far past the world edge before turning back.
	pub overshoot: f32,
	/// Simulated ticks.
	pub ticks: u32,
	/// Range queries issued per tick.
	pub queries_per_tick: usize,
	/// Half-size of every query box.
	pub query_half_size: f32,
	/// Slack of the approximate query.
	pub epsilon: f32,
	/// Run clean-up every this many ticks (0 disables it).
	pub cleanup_interval: u32,
	pub tree: TreeSection,
}

/// Tree construction parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreeSection {
	pub max_leaf_objects: usize,
	pub max_depth: u8,
	pub levels: usize,
	pub promotion_probability: f64,
	pub seed: Option<u64>,
}

impl Default for Scenario {
	fn default() -> Self {
		Self {
			world_half_size: 256.0,
			objects: 2_000,
			object_half_size: 0.5,
			speed: 2.0,
			overshoot: 16.0,
			ticks: 200,
			queries_per_tick: 16,
			query_half_size: 24.0,
			epsilon: 4.0,
			cleanup_interval: 20,
			tree: TreeSection::default(),
		}
	}
}

impl Default for TreeSection {
	fn default() -> Self {
		Self {
			max_leaf_objects: 8,
			max_depth: 8,
			levels: 4,
			promotion_probability: 0.5,
			seed: None,
		}
	}
}

impl Scenario {
	/// Load a scenario from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
		let scenario: Scenario =
			toml::from_str(&content).with_context(|| "Failed to parse scenario TOML")?;
		scenario.validate()?;
		Ok(scenario)
	}

	pub fn validate(&self) -> Result<()> {
		if self.world_half_size.is_nan() || self.world_half_size <= 0.0 {
			anyhow::bail!("world_half_size must be positive, got {}", self.world_half_size);
		}
		if self.object_half_size < 0.0 || self.query_half_size < 0.0 {
			anyhow::bail!("half sizes must not be negative");
		}
		if self.epsilon.is_nan() || self.epsilon < 0.0 {
			anyhow::bail!("epsilon must not be negative, got {}", self.epsilon);
		}
		self.skip_config()
			.validate()
			.context("Invalid tree section")?;
		Ok(())
	}

	pub fn world(&self) -> Aabb2 {
		Aabb2::new(Vec2::ZERO, Vec2::splat(self.world_half_size))
	}

	pub fn skip_config(&self) -> SkipTreeConfig<Aabb2> {
		let tree = TreeConfig::new(self.world())
			.with_max_leaf_objects(self.tree.max_leaf_objects)
			.with_max_depth(self.tree.max_depth)
			.with_initial_capacity(self.objects.max(1));
		let config = SkipTreeConfig::new(tree)
			.with_levels(self.tree.levels)
			.with_promotion_probability(self.tree.promotion_probability);
		match self.tree.seed {
			Some(seed) => config.with_seed(seed),
			None => config,
		}
	}
}
