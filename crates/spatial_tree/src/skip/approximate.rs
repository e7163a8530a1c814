//! Epsilon-approximate range query.
//!
//! Every object intersecting the query bounds is returned. Objects outside
//! the query but within `epsilon` of it may be returned too; nothing beyond
//! the extended bounds ever is.

use std::collections::VecDeque;

use super::SkipTree;
use crate::arena::SlotArena;
use crate::bounds::{Bounds, INTERSECTION_TOLERANCE};
use crate::node::Node;
use crate::tree::ROOT;

/// Work done by one approximate query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApproximateStats {
  /// Level-0 nodes taken off the queue.
  pub nodes_visited: usize,
  /// Levels climbed through links to shortcut a descent.
  pub level_jumps: usize,
  /// Objects appended to the results.
  pub collected: usize,
}

impl<T, B: Bounds> SkipTree<T, B> {
  /// Append to `results` every object intersecting `bounds`, plus possibly
  /// some objects intersecting `bounds` grown by `epsilon`.
  ///
  /// With `epsilon == 0` the result is exactly [`query`](Self::query)'s.
  ///
  /// # Panics
  /// Panics if `epsilon` is negative or NaN.
  #[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(self, bounds, results), name = "skip::approximate_query")
  )]
  pub fn approximate_query(&self, bounds: &B, epsilon: f32, results: &mut Vec<T>) -> ApproximateStats
  where
    T: Clone,
  {
    assert!(epsilon >= 0.0, "epsilon must be >= 0, got {epsilon}");
    let extended = if epsilon > 0.0 {
      bounds.extended(epsilon)
    } else {
      *bounds
    };

    let tree = self.base.as_tree();
    let mut stats = ApproximateStats::default();
    let before = results.len();
    let mut queue = VecDeque::from([ROOT]);

    while let Some(index) = queue.pop_front() {
      stats.nodes_visited += 1;
      let node = &tree.nodes[index];
      if !node.bounds.intersects(bounds) {
        continue;
      }

      if node.is_leaf {
        results.extend(
          tree
            .objects_in(index)
            .filter(|(_, object)| object.bounds.intersects(bounds))
            .map(|(_, object)| object.target.clone()),
        );
        continue;
      }

      if extended.contains(&node.bounds) {
        tree.collect_subtree(index, results);
        continue;
      }

      match self.critical_descent(index, bounds, &extended, &mut stats) {
        Some(deeper) => queue.push_back(deeper),
        None => {
          if let Some(first) = node.first_child() {
            queue.extend(first..first + B::CHILD_COUNT);
          }
        }
      }
    }

    stats.collected = results.len() - before;
    stats
  }

  /// Deeper level-0 node that answers for non-critical `start`, or `None`
  /// if `start` is critical and must be expanded.
  ///
  /// Climbs through the up links as far as they go, walks the stabbing
  /// path down each level, steps down at the deepest linked node, and
  /// finishes on level 0.
  fn critical_descent(&self, start: usize, bounds: &B, extended: &B, stats: &mut ApproximateStats) -> Option<usize> {
    let base = self.level_nodes(0);
    stabbing_child(base, start, bounds, extended)?;

    let mut level = 0;
    let mut node = start;
    while let Some(twin) = self.link_up(level, node) {
      level += 1;
      node = twin;
    }
    let top = level;

    while level > 0 {
      let nodes = self.level_nodes(level);
      let mut linked = self.link_down(level, node).map(|_| node);
      let mut cursor = node;
      while let Some(child) = stabbing_child(nodes, cursor, bounds, extended) {
        if nodes[child].is_leaf {
          break;
        }
        cursor = child;
        if self.link_down(level, cursor).is_some() {
          linked = Some(cursor);
        }
      }

      match linked.and_then(|linked| self.link_down(level, linked)) {
        Some(twin) => {
          node = twin;
          level -= 1;
        }
        None => {
          node = start;
          break;
        }
      }
    }
    if level == 0 && node != start {
      stats.level_jumps += top;
    }

    let mut cursor = node;
    while let Some(child) = stabbing_child(base, cursor, bounds, extended) {
      cursor = child;
    }
    (cursor != start).then_some(cursor)
  }
}

/// The single child of a non-critical branch.
///
/// Exactly one child may intersect `bounds`; it must cover as much of
/// `extended` as the branch does and still cross the boundary of
/// `extended`. Leaves and compressed branches have none.
fn stabbing_child<B: Bounds>(nodes: &SlotArena<Node<B>>, index: usize, bounds: &B, extended: &B) -> Option<usize> {
  let node = &nodes[index];
  let first = node.first_child()?;
  if nodes[first].depth != node.depth + 1 {
    return None;
  }

  let area = node.bounds.intersection_area(extended);
  let mut stabbing = None;
  for child in first..first + B::CHILD_COUNT {
    let cell = &nodes[child].bounds;
    if !cell.intersects(bounds) {
      continue;
    }
    if stabbing.is_some() || extended.contains(cell) || !same_area(cell.intersection_area(extended), area) {
      return None;
    }
    stabbing = Some(child);
  }
  stabbing
}

#[inline]
fn same_area(a: f32, b: f32) -> bool {
  (a - b).abs() <= a.abs().max(b.abs()) * INTERSECTION_TOLERANCE
}

#[cfg(test)]
#[path = "approximate_test.rs"]
mod approximate_test;
