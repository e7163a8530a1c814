//! Skip tree probe.
//!
//! Spawns a crowd of drifting boxes in a skip tree, updates them every tick
//! and checks each approximate range query against the exact one. Fails on
//! the first query that breaks the approximation contract.

mod scenario;
mod simulation;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use scenario::Scenario;
use simulation::Simulation;

/// Drive a skip tree with moving objects and verify its queries.
#[derive(Parser, Debug)]
#[command(name = "tree_probe")]
#[command(about = "Exercises a skip tree with moving objects and random queries")]
struct Args {
	/// Path to a scenario TOML file (defaults apply when omitted).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Seed for spawning, motion, queries and level promotion.
	#[arg(short, long)]
	seed: Option<u64>,

	/// Override the scenario's tick count.
	#[arg(short, long)]
	ticks: Option<u32>,

	/// Override the scenario's object count.
	#[arg(short, long)]
	objects: Option<usize>,

	/// Override the approximate query slack.
	#[arg(short, long)]
	epsilon: Option<f32>,
}

fn main() -> Result<()> {
	let args = Args::parse();

	let mut scenario = match &args.config {
		Some(path) => {
			println!("Loading scenario from: {}", path.display());
			Scenario::load(path)?
		}
		None => Scenario::default(),
	};
	if let Some(ticks) = args.ticks {
		scenario.ticks = ticks;
	}
	if let Some(objects) = args.objects {
		scenario.objects = objects;
	}
	if let Some(epsilon) = args.epsilon {
		scenario.epsilon = epsilon;
	}
	let seed = args
		.seed
		.or(scenario.tree.seed)
		.unwrap_or_else(rand::random);
	scenario.tree.seed = Some(seed);
	scenario.validate()?;

	println!(
		"World ±{} with {} objects, {} levels, epsilon {}, seed {}",
		scenario.world_half_size, scenario.objects, scenario.tree.levels, scenario.epsilon, seed
	);

	let mut simulation = Simulation::new(scenario, seed)?;
	let report = simulation.run()?;

	println!("\nRan {} ticks, {} queries", report.ticks, report.queries);
	println!(
		"  hits: {} exact, {} approximate (+{} within epsilon)",
		report.exact_hits, report.approximate_hits, report.extra_hits
	);
	if report.queries > 0 {
		println!(
			"  per query: {:.1} nodes visited, {:.2} level jumps",
			report.nodes_visited as f64 / report.queries as f64,
			report.level_jumps as f64 / report.queries as f64
		);
	}
	println!("  clean-up merged {} branches", report.merged);
	println!("  peak missing objects: {}", report.peak_missing);

	println!("\nLevels:");
	for (level, stats) in simulation.tree().level_stats().iter().enumerate() {
		println!(
			"  {level}: {} objects ({} placed), {} nodes ({} leaves, {} compressed), depth {}",
			stats.objects,
			stats.placed(),
			stats.nodes,
			stats.leaves,
			stats.compressed_branches,
			stats.deepest
		);
	}

	Ok(())
}
