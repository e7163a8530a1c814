use glam::Vec2;

use super::*;
use crate::bounds::Aabb2;
use crate::config::TreeConfig;

fn point(x: f32, y: f32) -> Aabb2 {
  Aabb2::from_point(Vec2::new(x, y))
}

fn unit_tree(max_leaf_objects: usize) -> Tree<&'static str, Aabb2> {
  let config = TreeConfig::new(Aabb2::new(Vec2::ZERO, Vec2::ONE))
    .with_max_leaf_objects(max_leaf_objects)
    .with_max_depth(6);
  Tree::new(config).unwrap()
}

/// `(index, depth, is_leaf, objects_count)` for every node in traversal order.
fn shape<T>(tree: &Tree<T, Aabb2>) -> Vec<(usize, u8, bool, usize)> {
  let mut shape = Vec::new();
  tree.traverse(ROOT, |node, visit| {
    shape.push((visit.index, node.depth(), node.is_leaf(), node.objects_count()));
    Walk::Continue
  });
  shape
}

#[test]
fn test_clean_up_merges_sparse_children() {
  let mut tree = unit_tree(1);
  let a = tree.try_add("a", point(0.5, 0.5)).unwrap();
  let b = tree.try_add("b", point(-0.5, -0.5)).unwrap();
  assert_eq!(tree.node_count(), 5);

  tree.remove(a);
  assert_eq!(tree.clean_up(), 1);

  assert_eq!(tree.node_count(), 1);
  assert!(tree.root().is_leaf());
  assert_eq!(tree.leaf_of(b), Some(ROOT), "Survivor moved up with a stable index");
  assert_eq!(tree.get(b), Some(&"b"));
  tree.assert_invariants();
}

#[test]
fn test_clean_up_keeps_full_groups() {
  let mut tree = unit_tree(2);
  tree.try_add("a", point(0.5, 0.5));
  tree.try_add("b", point(-0.5, -0.5));
  tree.try_add("c", point(0.5, -0.5));
  let before = shape(&tree);

  assert_eq!(tree.clean_up(), 0, "3 objects do not fit a leaf of 2");
  assert_eq!(shape(&tree), before);
}

#[test]
fn test_clean_up_merges_at_exact_capacity() {
  let mut tree = unit_tree(2);
  tree.try_add("a", point(0.5, 0.5));
  tree.try_add("b", point(-0.5, -0.5));
  let c = tree.try_add("c", point(0.5, -0.5)).unwrap();

  tree.remove(c);
  assert_eq!(tree.clean_up(), 1);
  assert_eq!(tree.root().objects_count(), 2);
}

/// Merging a deep group can make its parent's group mergeable in turn.
#[test]
fn test_clean_up_cascades_to_fixed_point() {
  let mut tree = unit_tree(1);
  let a = tree.try_add("a", point(0.75, 0.75)).unwrap();
  let b = tree.try_add("b", point(-0.75, -0.75)).unwrap();
  let c = tree.try_add("c", point(0.25, 0.25)).unwrap();
  assert_eq!(tree.stats().deepest, 2);

  tree.remove(a);
  tree.remove(c);
  assert_eq!(tree.clean_up(), 2);

  assert_eq!(tree.node_count(), 1);
  assert_eq!(tree.leaf_of(b), Some(ROOT));
  tree.assert_invariants();
}

#[test]
fn test_clean_up_is_idempotent() {
  let mut tree = unit_tree(2);
  let indices: Vec<_> = (0..12)
    .map(|i| {
      let t = i as f32 / 12.0;
      tree.try_add("o", point(t * 1.8 - 0.9, 0.9 - t * 1.5)).unwrap()
    })
    .collect();
  for &index in indices.iter().step_by(3) {
    tree.remove(index);
  }

  tree.clean_up();
  let settled = shape(&tree);
  assert_eq!(tree.clean_up(), 0);
  assert_eq!(shape(&tree), settled);
  tree.assert_invariants();
}

/// A branch with a branch child is never merged, even when empty overall.
#[test]
fn test_clean_up_skips_groups_with_branches() {
  let mut tree = unit_tree(1);
  tree.try_add("a", point(0.75, 0.75));
  tree.try_add("b", point(-0.75, -0.75));
  tree.try_add("c", point(0.25, 0.25));

  // Root's children include a branch; only the deeper group could merge,
  // and it still holds two objects.
  assert_eq!(tree.clean_up(), 0);
  assert_eq!(tree.node_count(), 9);
}

/// Freed child runs are reused by the next split.
#[test]
fn test_split_after_clean_up_reuses_slots() {
  let mut tree = unit_tree(1);
  let a = tree.try_add("a", point(0.5, 0.5)).unwrap();
  tree.try_add("b", point(-0.5, -0.5));
  let children = tree.nodes_at_depth(1);

  tree.remove(a);
  tree.clean_up();
  tree.try_add("c", point(0.5, 0.5));

  assert_eq!(tree.nodes_at_depth(1), children);
  tree.assert_invariants();
}

#[test]
fn test_clean_up_empty_tree() {
  let mut tree = unit_tree(4);
  assert_eq!(tree.clean_up(), 0);
  assert_eq!(tree.node_count(), 1);
}
