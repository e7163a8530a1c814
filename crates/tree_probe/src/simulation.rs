//! Moving-object simulation over a skip tree.
//!
//! Each tick every object drifts, is updated in the tree, and a batch of
//! random range queries compares the exact and approximate answers.

use std::collections::HashSet;

use anyhow::Result;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_tree::{Aabb2, ApproximateStats, Bounds, SkipTree};

use crate::scenario::Scenario;

struct Body {
	handle: usize,
	position: Vec2,
	velocity: Vec2,
}

/// Totals gathered over a run.
#[derive(Debug, Default)]
pub struct Report {
	pub ticks: u32,
	pub queries: usize,
	pub exact_hits: usize,
	pub approximate_hits: usize,
	/// Approximate hits outside the exact answer (inside the epsilon ring).
	pub extra_hits: usize,
	pub nodes_visited: usize,
	pub level_jumps: usize,
	pub merged: usize,
	pub peak_missing: usize,
}

pub struct Simulation {
	scenario: Scenario,
	tree: SkipTree<u32, Aabb2>,
	bodies: Vec<Body>,
	rng: StdRng,
}

impl Simulation {
	pub fn new(scenario: Scenario, seed: u64) -> Result<Self> {
		let mut tree = SkipTree::new(scenario.skip_config())?;
		let mut rng = StdRng::seed_from_u64(seed);
		let half = scenario.world_half_size;

		let mut bodies = Vec::with_capacity(scenario.objects);
		for id in 0..scenario.objects {
			let position = Vec2::new(rng.random_range(-half..half), rng.random_range(-half..half));
			let velocity = Vec2::new(
				rng.random_range(-scenario.speed..=scenario.speed),
				rng.random_range(-scenario.speed..=scenario.speed),
			);
			let bounds = Aabb2::new(position, Vec2::splat(scenario.object_half_size));
			let Some(handle) = tree.try_add(id as u32, bounds) else {
				anyhow::bail!("object {id} spawned outside the world");
			};
			bodies.push(Body {
				handle,
				position,
				velocity,
			});
		}

		Ok(Self {
			scenario,
			tree,
			bodies,
			rng,
		})
	}

	pub fn tree(&self) -> &SkipTree<u32, Aabb2> {
		&self.tree
	}

	pub fn run(&mut self) -> Result<Report> {
		let mut report = Report::default();
		let interval = self.scenario.cleanup_interval;

		for tick in 1..=self.scenario.ticks {
			let missing = self.step();
			report.peak_missing = report.peak_missing.max(missing);

			for _ in 0..self.scenario.queries_per_tick {
				self.probe(&mut report)?;
			}

			if interval > 0 && tick % interval == 0 {
				report.merged += self.tree.clean_up();
			}
			report.ticks = tick;
		}
		Ok(report)
	}

	/// Move every body and return how many are outside the world.
	fn step(&mut self) -> usize {
		let limit = self.scenario.world_half_size + self.scenario.overshoot;
		let extents = Vec2::splat(self.scenario.object_half_size);
		let mut missing = 0;

		for body in &mut self.bodies {
			body.position += body.velocity;
			if body.position.x.abs() > limit {
				body.velocity.x = -body.velocity.x;
			}
			if body.position.y.abs() > limit {
				body.velocity.y = -body.velocity.y;
			}

			self.tree.update(body.handle, Aabb2::new(body.position, extents));
			if self.tree.is_missing(body.handle) {
				missing += 1;
			}
		}
		missing
	}

	/// Run one random query both ways and check the approximate answer.
	fn probe(&mut self, report: &mut Report) -> Result<()> {
		let half = self.scenario.world_half_size;
		let center = Vec2::new(self.rng.random_range(-half..half), self.rng.random_range(-half..half));
		let range = Aabb2::new(center, Vec2::splat(self.scenario.query_half_size));
		let epsilon = self.scenario.epsilon;

		let mut exact = Vec::new();
		self.tree.query(&range, &mut exact);
		let mut approximate = Vec::new();
		let stats: ApproximateStats = self.tree.approximate_query(&range, epsilon, &mut approximate);

		let found: HashSet<u32> = approximate.iter().copied().collect();
		if found.len() != approximate.len() {
			anyhow::bail!("approximate query returned duplicates for {range:?}");
		}
		if let Some(lost) = exact.iter().find(|&&id| !found.contains(&id)) {
			anyhow::bail!("object {lost} intersects {range:?} but the approximate query missed it");
		}

		let extended = if epsilon > 0.0 { range.extended(epsilon) } else { range };
		for &id in &approximate {
			let body = &self.bodies[id as usize];
			let bounds = self.tree.bounds_of(body.handle).copied().unwrap_or_else(|| {
				Aabb2::new(body.position, Vec2::splat(self.scenario.object_half_size))
			});
			if !extended.intersects(&bounds) {
				anyhow::bail!("object {id} at {:?} lies outside {extended:?}", bounds.center);
			}
		}

		report.queries += 1;
		report.exact_hits += exact.len();
		report.approximate_hits += approximate.len();
		report.extra_hits += approximate.len() - exact.len();
		report.nodes_visited += stats.nodes_visited;
		report.level_jumps += stats.level_jumps;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn small_scenario() -> Scenario {
		let mut scenario: Scenario = toml::from_str(
			r#"
			world_half_size = 64.0
			objects = 300
			ticks = 30
			queries_per_tick = 8
			cleanup_interval = 5
			[tree]
			max_leaf_objects = 4
			levels = 3
			"#,
		)
		.unwrap();
		scenario.tree.seed = Some(5);
		scenario
	}

	#[test]
	fn run_holds_superset_law() {
		let mut simulation = Simulation::new(small_scenario(), 5).unwrap();
		let report = simulation.run().unwrap();

		assert_eq!(report.ticks, 30);
		assert_eq!(report.queries, 30 * 8);
		assert!(report.approximate_hits >= report.exact_hits);
		assert_eq!(simulation.tree().len(), 300);
	}

	#[test]
	fn objects_wander_out_and_back() {
		let mut scenario = small_scenario();
		scenario.speed = 6.0;
		scenario.overshoot = 24.0;
		scenario.ticks = 60;
		let mut simulation = Simulation::new(scenario, 8).unwrap();
		let report = simulation.run().unwrap();

		assert!(report.peak_missing > 0, "{report:?}");
		assert_eq!(simulation.tree().len(), 300, "Missing objects are kept");
	}
}
