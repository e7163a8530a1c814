//! Insertion, update and query benchmarks for the three tree flavours.
//!
//! Objects are small boxes scattered uniformly over a 1024-unit world with
//! a fixed seed, so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_tree::{Aabb2, CompressedTree, SkipTree, SkipTreeConfig, Tree, TreeConfig};

const HALF_SIZE: f32 = 512.0;
const OBJECT_COUNTS: [usize; 3] = [1_000, 10_000, 50_000];

fn config() -> TreeConfig<Aabb2> {
  TreeConfig::new(Aabb2::new(Vec2::ZERO, Vec2::splat(HALF_SIZE)))
    .with_max_leaf_objects(8)
    .with_max_depth(8)
}

fn scatter(count: usize, seed: u64) -> Vec<Aabb2> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count)
    .map(|_| {
      let center = Vec2::new(
        rng.random_range(-HALF_SIZE..HALF_SIZE),
        rng.random_range(-HALF_SIZE..HALF_SIZE),
      );
      Aabb2::new(center, Vec2::splat(rng.random_range(0.1..2.0)))
    })
    .collect()
}

fn queries(seed: u64) -> Vec<Aabb2> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..256)
    .map(|_| {
      let center = Vec2::new(
        rng.random_range(-HALF_SIZE..HALF_SIZE),
        rng.random_range(-HALF_SIZE..HALF_SIZE),
      );
      Aabb2::new(center, Vec2::splat(rng.random_range(4.0..64.0)))
    })
    .collect()
}

// =============================================================================
// Insertion
// =============================================================================

fn bench_insert(c: &mut Criterion) {
  let mut group = c.benchmark_group("insert");

  for count in OBJECT_COUNTS {
    let objects = scatter(count, 1);
    group.throughput(Throughput::Elements(count as u64));

    group.bench_with_input(BenchmarkId::new("tree", count), &objects, |b, objects| {
      b.iter(|| {
        let mut tree = Tree::new(config()).unwrap();
        for (id, bounds) in objects.iter().enumerate() {
          tree.try_add(id, *bounds);
        }
        black_box(tree.node_count())
      });
    });

    group.bench_with_input(BenchmarkId::new("compressed", count), &objects, |b, objects| {
      b.iter(|| {
        let mut tree = CompressedTree::new(config()).unwrap();
        for (id, bounds) in objects.iter().enumerate() {
          tree.try_add(id, *bounds);
        }
        black_box(tree.len())
      });
    });

    group.bench_with_input(BenchmarkId::new("skip_4", count), &objects, |b, objects| {
      b.iter(|| {
        let mut tree = SkipTree::new(SkipTreeConfig::new(config()).with_levels(4).with_seed(7)).unwrap();
        for (id, bounds) in objects.iter().enumerate() {
          tree.try_add(id, *bounds);
        }
        black_box(tree.len())
      });
    });
  }

  group.finish();
}

// =============================================================================
// Update
// =============================================================================

/// Every object nudged by a small offset, as a moving-object frame would.
fn bench_update(c: &mut Criterion) {
  let mut group = c.benchmark_group("update");
  let count = 10_000;
  let objects = scatter(count, 2);
  group.throughput(Throughput::Elements(count as u64));

  group.bench_function("tree", |b| {
    let mut tree = Tree::new(config()).unwrap();
    let indices: Vec<_> = objects
      .iter()
      .enumerate()
      .filter_map(|(id, bounds)| tree.try_add(id, *bounds))
      .collect();
    let mut frame = 0u32;
    b.iter(|| {
      frame += 1;
      let offset = Vec2::new((frame % 7) as f32 - 3.0, (frame % 5) as f32 - 2.0);
      for (&index, bounds) in indices.iter().zip(&objects) {
        tree.update(index, Aabb2::new(bounds.center + offset, bounds.extents));
      }
    });
  });

  group.finish();
}

// =============================================================================
// Queries
// =============================================================================

fn bench_query(c: &mut Criterion) {
  let mut group = c.benchmark_group("query");
  let ranges = queries(3);

  for count in OBJECT_COUNTS {
    let objects = scatter(count, 4);
    let mut tree = SkipTree::new(SkipTreeConfig::new(config()).with_levels(4).with_seed(11)).unwrap();
    for (id, bounds) in objects.iter().enumerate() {
      tree.try_add(id, *bounds);
    }

    group.throughput(Throughput::Elements(ranges.len() as u64));
    group.bench_with_input(BenchmarkId::new("exact", count), &ranges, |b, ranges| {
      let mut hits = Vec::new();
      b.iter(|| {
        for range in ranges {
          hits.clear();
          tree.query(range, &mut hits);
        }
        black_box(hits.len())
      });
    });

    for epsilon in [1.0f32, 8.0] {
      group.bench_with_input(
        BenchmarkId::new(format!("approximate_eps_{epsilon}"), count),
        &ranges,
        |b, ranges| {
          let mut hits = Vec::new();
          b.iter(|| {
            for range in ranges {
              hits.clear();
              tree.approximate_query(range, epsilon, &mut hits);
            }
            black_box(hits.len())
          });
        },
      );
    }
  }

  group.finish();
}

criterion_group!(benches, bench_insert, bench_update, bench_query);
criterion_main!(benches);
