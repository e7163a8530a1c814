//! Correspondence between bounds-identical branches of adjacent levels.

use std::collections::HashMap;

use crate::arena::SlotArena;
use crate::bounds::Bounds;
use crate::node::Node;

/// Up/down node links between level `i` and level `i + 1`.
#[derive(Clone, Debug, Default)]
pub(crate) struct LevelLinks {
  /// Revisions of the (lower, upper) trees the links were built from.
  revisions: (u64, u64),
  up: HashMap<usize, usize>,
  down: HashMap<usize, usize>,
}

impl LevelLinks {
  #[inline]
  pub(crate) fn is_current(&self, revisions: (u64, u64)) -> bool {
    self.revisions == revisions
  }

  /// Link every branch of `lower` to the branch of `upper` with bit-equal
  /// bounds, if there is one.
  pub(crate) fn build<B: Bounds>(
    lower: &SlotArena<Node<B>>,
    upper: &SlotArena<Node<B>>,
    revisions: (u64, u64),
  ) -> Self {
    let upper_branches: HashMap<B::Key, usize> = upper
      .iter()
      .filter(|(_, node)| !node.is_leaf())
      .map(|(index, node)| (node.bounds().key(), index))
      .collect();

    let mut links = Self {
      revisions,
      ..Self::default()
    };
    for (index, node) in lower.iter().filter(|(_, node)| !node.is_leaf()) {
      if let Some(&twin) = upper_branches.get(&node.bounds().key()) {
        links.up.insert(index, twin);
        links.down.insert(twin, index);
      }
    }
    links
  }

  /// Twin of a lower-level node on the upper level.
  #[inline]
  pub(crate) fn up(&self, lower: usize) -> Option<usize> {
    self.up.get(&lower).copied()
  }

  /// Twin of an upper-level node on the lower level.
  #[inline]
  pub(crate) fn down(&self, upper: usize) -> Option<usize> {
    self.down.get(&upper).copied()
  }

  #[cfg(feature = "tracing")]
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.up.len()
  }
}
