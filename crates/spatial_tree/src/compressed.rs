//! Path-compressed tree.
//!
//! A branch whose only non-empty child is itself a branch carries no
//! information. Compression drops every such link of a chain and lets the
//! top branch adopt the children of the last one directly, so a compressed
//! branch has children more than one level below it. Insertion that lands
//! outside the adopted children re-expands the branch one level at a time.

use smallvec::{smallvec, SmallVec};

use crate::bounds::Bounds;
use crate::config::{ConfigError, TreeConfig};
use crate::node::Node;
use crate::stats::TreeStats;
use crate::tree::{Tree, ROOT};

/// Quadtree/octree that keeps chains of single-child branches collapsed.
pub struct CompressedTree<T, B> {
  tree: Tree<T, B>,
}

impl<T, B: Bounds> CompressedTree<T, B> {
  pub fn new(config: TreeConfig<B>) -> Result<Self, ConfigError> {
    Ok(Self {
      tree: Tree::new(config)?,
    })
  }

  /// Read access to the underlying node and object arenas.
  #[inline]
  pub fn as_tree(&self) -> &Tree<T, B> {
    &self.tree
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.tree.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.tree.is_empty()
  }

  #[inline]
  pub fn contains(&self, index: usize) -> bool {
    self.tree.contains(index)
  }

  #[inline]
  pub fn get(&self, index: usize) -> Option<&T> {
    self.tree.get(index)
  }

  #[inline]
  pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
    self.tree.get_mut(index)
  }

  #[inline]
  pub fn bounds_of(&self, index: usize) -> Option<&B> {
    self.tree.bounds_of(index)
  }

  #[inline]
  pub fn is_missing(&self, index: usize) -> bool {
    self.tree.is_missing(index)
  }

  #[inline]
  pub fn revision(&self) -> u64 {
    self.tree.revision()
  }

  pub fn stats(&self) -> TreeStats {
    self.tree.stats()
  }

  /// Insert `target`, returning its index, or `None` if `bounds` misses the
  /// root.
  pub fn try_add(&mut self, target: T, bounds: B) -> Option<usize> {
    let revision = self.tree.revision;
    let index = self.tree.add_with(target, bounds, Tree::place_decompressing)?;
    self.compress_if_changed(revision);
    Some(index)
  }

  pub fn try_remove(&mut self, index: usize) -> Option<T> {
    self.tree.try_remove(index)
  }

  /// # Panics
  /// Panics if `index` is not live.
  pub fn remove(&mut self, index: usize) -> T {
    self.tree.remove(index)
  }

  /// Move an object to `bounds`; see [`Tree::update`].
  ///
  /// # Panics
  /// Panics if `index` is not live.
  pub fn update(&mut self, index: usize, bounds: B) -> usize {
    let revision = self.tree.revision;
    let index = self.tree.relocate(index, bounds, Tree::place_decompressing);
    self.compress_if_changed(revision);
    index
  }

  pub fn query(&self, bounds: &B, results: &mut Vec<T>)
  where
    T: Clone,
  {
    self.tree.query(bounds, results);
  }

  pub fn query_indices(&self, bounds: &B, results: &mut Vec<usize>) {
    self.tree.query_indices(bounds, results);
  }

  /// Merge sparse branches, then compress what the merge left behind.
  /// Returns the number of merged branches.
  pub fn clean_up(&mut self) -> usize {
    let merged = self.tree.clean_up();
    self.compress();
    merged
  }

  /// Collapse every single-child branch chain; returns the number of
  /// chains collapsed.
  #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, name = "compressed::compress"))]
  pub fn compress(&mut self) -> usize {
    let collapsed = self.tree.compress_chains();
    #[cfg(feature = "tracing")]
    if collapsed > 0 {
      tracing::debug!(collapsed, nodes = self.tree.node_count(), "compressed branch chains");
    }
    collapsed
  }

  fn compress_if_changed(&mut self, revision: u64) {
    if self.tree.revision != revision {
      self.compress();
    }
  }
}

impl<T, B: Bounds> Tree<T, B> {
  /// Link a detached object, expanding compressed branches that the object
  /// falls outside of. Returns false if it misses the root.
  pub(crate) fn place_decompressing(&mut self, index: usize) -> bool {
    let bounds = self.objects[index].bounds;
    loop {
      let Some(target) = self.locate(&bounds) else {
        return false;
      };
      if self.is_compressed(target) {
        self.decompress(target);
        continue;
      }
      self.place_in_leaf(target, index);
      return true;
    }
  }

  /// Re-expand one level of a compressed branch.
  ///
  /// The branch gets a fresh group of direct children; the child covering
  /// the previously adopted group takes that group over.
  fn decompress(&mut self, index: usize) {
    let (depth, bounds, adopted) = {
      let node = &self.nodes[index];
      debug_assert!(self.is_compressed(index), "node {index} is not compressed");
      (node.depth, node.bounds, node.head)
    };
    let Some(adopted) = adopted else {
      return;
    };

    let first = self.nodes.add_run(
      (0..B::CHILD_COUNT).map(|quadrant| Node::leaf(Some(index), depth + 1, bounds.child_bounds(quadrant))),
    );

    // Equal cells: the nearest center is the cell that holds the point.
    let anchor = self.nodes[adopted].bounds;
    let host = (first..first + B::CHILD_COUNT)
      .min_by(|&a, &b| {
        let da = self.nodes[a].bounds.center_distance_squared(&anchor);
        let db = self.nodes[b].bounds.center_distance_squared(&anchor);
        da.total_cmp(&db)
      })
      .unwrap_or(first);

    for child in adopted..adopted + B::CHILD_COUNT {
      self.nodes[child].parent = Some(host);
    }
    {
      let node = &mut self.nodes[host];
      node.is_leaf = false;
      node.head = Some(adopted);
    }
    self.nodes[index].head = Some(first);

    self.revision += 1;
    #[cfg(feature = "tracing")]
    tracing::trace!(node = index, host, depth, "decompressed branch");
  }

  /// The only non-empty child of a branch, if that child is a branch too.
  fn sole_branch_child(&self, index: usize) -> Option<usize> {
    let first = self.nodes[index].first_child()?;
    let mut sole = None;
    for child in first..first + B::CHILD_COUNT {
      let node = &self.nodes[child];
      if node.is_leaf && node.objects_count == 0 {
        continue;
      }
      if node.is_leaf || sole.is_some() {
        return None;
      }
      sole = Some(child);
    }
    sole
  }

  fn compress_chains(&mut self) -> usize {
    let mut collapsed = 0;
    let mut stack: SmallVec<[usize; 64]> = smallvec![ROOT];

    while let Some(index) = stack.pop() {
      if let Some(mut end) = self.sole_branch_child(index) {
        let mut groups: SmallVec<[usize; 8]> = SmallVec::new();
        groups.extend(self.nodes[index].first_child());
        while let Some(next) = self.sole_branch_child(end) {
          groups.extend(self.nodes[end].first_child());
          end = next;
        }

        let Some(adopted) = self.nodes[end].first_child() else {
          continue;
        };
        for first in groups {
          self.nodes.remove_run(first, B::CHILD_COUNT);
        }
        for child in adopted..adopted + B::CHILD_COUNT {
          self.nodes[child].parent = Some(index);
        }
        self.nodes[index].head = Some(adopted);

        self.revision += 1;
        collapsed += 1;
      }

      if let Some(first) = self.nodes[index].first_child() {
        stack.extend((first..first + B::CHILD_COUNT).rev());
      }
    }
    collapsed
  }
}

#[cfg(test)]
#[path = "compressed_test.rs"]
mod compressed_test;
