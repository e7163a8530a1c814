//! Base tree: bucketed quadtree/octree over an arena of nodes and objects.
//!
//! Objects live in intrusive per-leaf chains. Insertion descends to the
//! deepest node intersecting the object, splitting full leaves until the
//! depth cap; removal only unlinks, merging is deferred to
//! [`Tree::clean_up`].
//!
//! # Placement rule
//!
//! An object is stored in exactly one leaf: the first child (in quadrant
//! order 0..CHILD_COUNT) whose bounds intersect the object, at every level.
//! Objects straddling a cell boundary therefore live on the low-quadrant
//! side of it, and queries only find them through that cell.

mod cleanup;
mod traversal;

use std::collections::HashSet;

use smallvec::{smallvec, SmallVec};

pub use traversal::{Visit, Walk};

use crate::arena::SlotArena;
use crate::bounds::Bounds;
use crate::config::{ConfigError, TreeConfig};
use crate::node::{Node, NodeObject};
use crate::stats::TreeStats;

/// Arena index of the root node.
pub const ROOT: usize = 0;

/// Dynamic quadtree (`Aabb2`) or octree (`Aabb3`) of objects `T`.
pub struct Tree<T, B> {
  pub(crate) nodes: SlotArena<Node<B>>,
  pub(crate) objects: SlotArena<NodeObject<T, B>>,
  /// Objects detached because their bounds left the root.
  missing: HashSet<usize>,
  max_leaf_objects: usize,
  max_depth: u8,
  /// Bumped by every structural change (split, merge, (de)compression).
  pub(crate) revision: u64,
}

impl<T, B: Bounds> Tree<T, B> {
  /// Create a tree holding a single empty root leaf.
  pub fn new(config: TreeConfig<B>) -> Result<Self, ConfigError> {
    config.validate()?;
    #[cfg(feature = "tracing")]
    if config.max_depth > config.effective_max_depth() {
      tracing::warn!(
        requested = config.max_depth,
        applied = config.effective_max_depth(),
        "max_depth clamped"
      );
    }

    let mut nodes = SlotArena::with_capacity(B::CHILD_COUNT + 1);
    let root = nodes.add(Node::leaf(None, 0, config.bounds));
    debug_assert_eq!(root, ROOT);

    Ok(Self {
      nodes,
      objects: SlotArena::with_capacity(config.initial_objects_capacity),
      missing: HashSet::new(),
      max_leaf_objects: config.max_leaf_objects,
      max_depth: config.effective_max_depth(),
      revision: 0,
    })
  }

  // ===========================================================================
  // Accessors
  // ===========================================================================

  /// Root bounds.
  #[inline]
  pub fn bounds(&self) -> &B {
    &self.nodes[ROOT].bounds
  }

  #[inline]
  pub fn root(&self) -> &Node<B> {
    &self.nodes[ROOT]
  }

  #[inline]
  pub fn max_leaf_objects(&self) -> usize {
    self.max_leaf_objects
  }

  #[inline]
  pub fn max_depth(&self) -> u8 {
    self.max_depth
  }

  #[inline]
  pub fn child_count(&self) -> usize {
    B::CHILD_COUNT
  }

  /// Live objects, missing ones included.
  #[inline]
  pub fn len(&self) -> usize {
    self.objects.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  #[inline]
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// Structural revision; changes whenever nodes are created or destroyed.
  #[inline]
  pub fn revision(&self) -> u64 {
    self.revision
  }

  #[inline]
  pub fn node(&self, index: usize) -> Option<&Node<B>> {
    self.nodes.get(index)
  }

  #[inline]
  pub fn object(&self, index: usize) -> Option<&NodeObject<T, B>> {
    self.objects.get(index)
  }

  /// Whether `index` names a live object.
  #[inline]
  pub fn contains(&self, index: usize) -> bool {
    self.objects.contains(index)
  }

  #[inline]
  pub fn get(&self, index: usize) -> Option<&T> {
    self.objects.get(index).map(|object| &object.target)
  }

  #[inline]
  pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
    self.objects.get_mut(index).map(|object| &mut object.target)
  }

  /// Last stored bounds of an object.
  #[inline]
  pub fn bounds_of(&self, index: usize) -> Option<&B> {
    self.objects.get(index).map(|object| &object.bounds)
  }

  /// Leaf currently holding an object (`None` if missing or dead).
  #[inline]
  pub fn leaf_of(&self, index: usize) -> Option<usize> {
    self.objects.get(index).and_then(|object| object.leaf)
  }

  #[inline]
  pub fn is_missing(&self, index: usize) -> bool {
    self.missing.contains(&index)
  }

  /// Indices of objects currently outside the root, in no particular order.
  pub fn missing(&self) -> impl Iterator<Item = usize> + '_ {
    self.missing.iter().copied()
  }

  /// Objects chained to a leaf (empty for branches).
  pub fn objects_in(&self, leaf: usize) -> ObjectChain<'_, T, B> {
    ObjectChain {
      objects: &self.objects,
      cursor: self.nodes[leaf].first_object(),
    }
  }

  /// True for a branch whose children were adopted from a deeper level.
  pub fn is_compressed(&self, index: usize) -> bool {
    let node = &self.nodes[index];
    node
      .first_child()
      .is_some_and(|first| self.nodes[first].depth > node.depth + 1)
  }

  /// Indices of every node at `depth`, in traversal order.
  pub fn nodes_at_depth(&self, depth: u8) -> Vec<usize> {
    let mut found = Vec::new();
    self.traverse(ROOT, |node, visit| {
      if node.depth == depth {
        found.push(visit.index);
        Walk::Skip
      } else if node.depth > depth {
        Walk::Skip
      } else {
        Walk::Continue
      }
    });
    found
  }

  pub fn stats(&self) -> TreeStats {
    let mut stats = TreeStats {
      nodes: self.nodes.len(),
      objects: self.objects.len(),
      missing: self.missing.len(),
      ..TreeStats::default()
    };
    for (index, node) in self.nodes.iter() {
      if node.is_leaf {
        stats.leaves += 1;
      } else {
        stats.branches += 1;
        if self.is_compressed(index) {
          stats.compressed_branches += 1;
        }
      }
      stats.deepest = stats.deepest.max(node.depth);
    }
    stats
  }

  // ===========================================================================
  // Insertion
  // ===========================================================================

  /// Insert `target`, returning its index, or `None` if `bounds` misses the
  /// root.
  pub fn try_add(&mut self, target: T, bounds: B) -> Option<usize> {
    self.add_with(target, bounds, Self::place_from_root)
  }

  /// Shared insertion path; `place` links the freshly stored object.
  pub(crate) fn add_with<F>(&mut self, target: T, bounds: B, place: F) -> Option<usize>
  where
    F: FnOnce(&mut Self, usize) -> bool,
  {
    if !self.bounds().intersects(&bounds) {
      return None;
    }
    let index = self.objects.add(NodeObject::detached(target, bounds));
    let placed = place(self, index);
    debug_assert!(placed, "object {index} intersects the root but found no leaf");
    Some(index)
  }

  /// Deepest node reached by following the first intersecting child from
  /// the root; `None` if the root itself misses `bounds`.
  pub(crate) fn locate(&self, bounds: &B) -> Option<usize> {
    let mut deepest = None;
    self.traverse(ROOT, |node, visit| {
      if node.bounds.intersects(bounds) {
        deepest = Some(visit.index);
        Walk::ContinueInDepth
      } else {
        Walk::Skip
      }
    });
    deepest
  }

  /// Link a detached object below the root. Returns false if it misses the
  /// root.
  pub(crate) fn place_from_root(&mut self, index: usize) -> bool {
    let bounds = self.objects[index].bounds;
    match self.locate(&bounds) {
      Some(target) => {
        self.place_in_leaf(target, index);
        true
      }
      None => false,
    }
  }

  /// Link a detached object at or below `target`, splitting full leaves on
  /// the way down.
  pub(crate) fn place_in_leaf(&mut self, mut target: usize, index: usize) {
    let bounds = self.objects[index].bounds;
    loop {
      let node = &self.nodes[target];
      if !node.is_leaf {
        target = self.child_for(target, &bounds);
        continue;
      }
      if node.depth >= self.max_depth || node.objects_count < self.max_leaf_objects {
        self.link(target, index);
        return;
      }
      self.split(target);
    }
  }

  /// First child intersecting `bounds`, falling back to the child with the
  /// nearest center.
  pub(crate) fn child_for(&self, parent: usize, bounds: &B) -> usize {
    let first = self.nodes[parent]
      .first_child()
      .unwrap_or_else(|| panic!("node {parent} is not a branch"));
    let children = first..first + B::CHILD_COUNT;

    children
      .clone()
      .find(|&child| self.nodes[child].bounds.intersects(bounds))
      .or_else(|| {
        children.min_by(|&a, &b| {
          let da = self.nodes[a].bounds.center_distance_squared(bounds);
          let db = self.nodes[b].bounds.center_distance_squared(bounds);
          da.total_cmp(&db)
        })
      })
      .unwrap_or(first)
  }

  /// Turn a leaf into a branch and redistribute its chain over the new
  /// children. Children that still overflow are split in turn.
  pub(crate) fn split(&mut self, leaf: usize) {
    let mut pending: SmallVec<[usize; 8]> = smallvec![leaf];

    while let Some(target) = pending.pop() {
      let (depth, bounds, chain) = {
        let node = &self.nodes[target];
        assert!(node.is_leaf, "cannot split branch {target}");
        (node.depth, node.bounds, node.head)
      };

      let first = self.nodes.add_run(
        (0..B::CHILD_COUNT).map(|quadrant| Node::leaf(Some(target), depth + 1, bounds.child_bounds(quadrant))),
      );
      {
        let node = &mut self.nodes[target];
        node.is_leaf = false;
        node.head = Some(first);
        node.objects_count = 0;
      }

      let mut cursor = chain;
      while let Some(index) = cursor {
        let object = &self.objects[index];
        cursor = object.next;
        let object_bounds = object.bounds;
        let child = self.child_for(target, &object_bounds);
        self.link(child, index);
      }

      self.revision += 1;
      #[cfg(feature = "tracing")]
      tracing::trace!(node = target, depth, "split leaf");

      if depth + 1 < self.max_depth {
        pending.extend(
          (first..first + B::CHILD_COUNT)
            .filter(|&child| self.nodes[child].objects_count > self.max_leaf_objects),
        );
      }
    }
  }

  /// Push an object onto the front of a leaf chain.
  pub(crate) fn link(&mut self, leaf: usize, index: usize) {
    let node = &mut self.nodes[leaf];
    debug_assert!(node.is_leaf, "cannot link object {index} into branch {leaf}");
    let head = node.head.replace(index);
    node.objects_count += 1;

    let object = &mut self.objects[index];
    object.leaf = Some(leaf);
    object.next = head;
  }

  /// Detach an object from its leaf chain. No-op for missing objects.
  pub(crate) fn unlink(&mut self, index: usize) {
    let (leaf, next) = {
      let object = &mut self.objects[index];
      let Some(leaf) = object.leaf.take() else {
        return;
      };
      (leaf, object.next.take())
    };

    let node = &mut self.nodes[leaf];
    if node.head == Some(index) {
      node.head = next;
    } else {
      let mut cursor = node.head;
      while let Some(current) = cursor {
        let object = &mut self.objects[current];
        if object.next == Some(index) {
          object.next = next;
          break;
        }
        cursor = object.next;
      }
    }
    node.objects_count -= 1;
  }

  /// Free the contiguous children of `index` and turn it back into an empty
  /// leaf. Objects still chained to those children must be moved first.
  pub(crate) fn delete_children_of(&mut self, index: usize) {
    let Some(first) = self.nodes[index].first_child() else {
      return;
    };
    self.nodes.remove_run(first, B::CHILD_COUNT);

    let node = &mut self.nodes[index];
    node.is_leaf = true;
    node.head = None;
    node.objects_count = 0;
    self.revision += 1;
  }

  // ===========================================================================
  // Removal and relocation
  // ===========================================================================

  /// Remove an object, returning it, or `None` if `index` is not live.
  ///
  /// Emptied leaves stay in place until [`clean_up`](Self::clean_up).
  pub fn try_remove(&mut self, index: usize) -> Option<T> {
    if !self.objects.contains(index) {
      return None;
    }
    self.unlink(index);
    self.missing.remove(&index);
    Some(self.objects.remove_at(index).target)
  }

  /// Remove a live object.
  ///
  /// # Panics
  /// Panics if `index` is not live.
  pub fn remove(&mut self, index: usize) -> T {
    self
      .try_remove(index)
      .unwrap_or_else(|| panic!("object {index} is not live"))
  }

  /// Move an object to `bounds`, returning its index.
  ///
  /// Stays in place while its leaf still intersects `bounds`; otherwise it
  /// is re-inserted from the root. An object moved outside the root becomes
  /// missing and is retried on its next update.
  ///
  /// # Panics
  /// Panics if `index` is not live.
  pub fn update(&mut self, index: usize, bounds: B) -> usize {
    self.relocate(index, bounds, Self::place_from_root)
  }

  /// Shared update path; `place` links the detached object and reports
  /// whether it found a home.
  pub(crate) fn relocate<F>(&mut self, index: usize, bounds: B, place: F) -> usize
  where
    F: FnOnce(&mut Self, usize) -> bool,
  {
    let leaf = self
      .objects
      .get(index)
      .unwrap_or_else(|| panic!("object {index} is not live"))
      .leaf;

    if let Some(leaf) = leaf {
      if self.nodes[leaf].bounds.intersects(&bounds) {
        self.objects[index].bounds = bounds;
        return index;
      }
      self.unlink(index);
    }

    self.objects[index].bounds = bounds;
    if place(self, index) {
      let _recovered = self.missing.remove(&index);
      #[cfg(feature = "tracing")]
      if _recovered {
        tracing::debug!(index, "missing object re-entered the tree");
      }
    } else {
      let _lost = self.missing.insert(index);
      #[cfg(feature = "tracing")]
      if _lost {
        tracing::debug!(index, "object left the tree bounds");
      }
    }
    index
  }

  // ===========================================================================
  // Queries
  // ===========================================================================

  /// Append every object intersecting `bounds` to `results`.
  pub fn query(&self, bounds: &B, results: &mut Vec<T>)
  where
    T: Clone,
  {
    self.query_with(bounds, |_, object| results.push(object.target.clone()));
  }

  /// Same as [`query`](Self::query) but yields object indices.
  pub fn query_indices(&self, bounds: &B, results: &mut Vec<usize>) {
    self.query_with(bounds, |index, _| results.push(index));
  }

  fn query_with<F>(&self, bounds: &B, mut visit: F)
  where
    F: FnMut(usize, &NodeObject<T, B>),
  {
    self.traverse(ROOT, |node, _| {
      if !node.bounds.intersects(bounds) {
        return Walk::Skip;
      }
      if node.is_leaf {
        let chain = ObjectChain {
          objects: &self.objects,
          cursor: node.head,
        };
        for (index, object) in chain {
          if object.bounds.intersects(bounds) {
            visit(index, object);
          }
        }
      }
      Walk::Continue
    });
  }

  /// Append every object stored below `start`, unfiltered.
  pub fn collect_subtree(&self, start: usize, results: &mut Vec<T>)
  where
    T: Clone,
  {
    self.traverse(start, |node, _| {
      if node.is_leaf {
        let chain = ObjectChain {
          objects: &self.objects,
          cursor: node.head,
        };
        results.extend(chain.map(|(_, object)| object.target.clone()));
      }
      Walk::Continue
    });
  }

  /// Panic if any structural invariant is broken.
  #[cfg(test)]
  pub(crate) fn assert_invariants(&self) {
    let mut reachable = 0;
    self.traverse(ROOT, |_, _| {
      reachable += 1;
      Walk::Continue
    });
    assert_eq!(reachable, self.nodes.len(), "every live node is reachable");

    for (index, node) in self.nodes.iter() {
      match node.first_child() {
        Some(first) => {
          assert_eq!(node.objects_count, 0, "branch {index} holds no objects");
          for child in first..first + B::CHILD_COUNT {
            let child_node = &self.nodes[child];
            assert_eq!(child_node.parent, Some(index), "child {child} parent link");
            assert!(child_node.depth > node.depth, "child {child} is deeper");
            assert_eq!(child_node.depth, self.nodes[first].depth, "siblings share depth");
            assert!(node.bounds.contains(&child_node.bounds), "child {child} inside parent");
          }
        }
        None => {
          let chain: Vec<_> = self.objects_in(index).collect();
          assert_eq!(chain.len(), node.objects_count, "leaf {index} chain length");
          for (object_index, object) in chain {
            assert_eq!(object.leaf, Some(index), "object {object_index} owner");
          }
        }
      }
    }

    for (index, object) in self.objects.iter() {
      assert_eq!(
        object.leaf.is_none(),
        self.missing.contains(&index),
        "object {index} is detached exactly when missing"
      );
      if let Some(leaf) = object.leaf {
        assert!(self.nodes[leaf].is_leaf, "object {index} owner is a leaf");
        assert!(
          self.nodes[leaf].bounds.intersects(&object.bounds),
          "object {index} intersects its leaf"
        );
      }
    }
  }
}

/// Iterator over one leaf's object chain, yielding `(index, object)`.
pub struct ObjectChain<'a, T, B> {
  objects: &'a SlotArena<NodeObject<T, B>>,
  cursor: Option<usize>,
}

impl<'a, T, B> Iterator for ObjectChain<'a, T, B> {
  type Item = (usize, &'a NodeObject<T, B>);

  fn next(&mut self) -> Option<Self::Item> {
    let index = self.cursor?;
    let object = &self.objects[index];
    self.cursor = object.next;
    Some((index, object))
  }
}
