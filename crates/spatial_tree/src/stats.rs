//! Structural statistics of a tree.

/// Snapshot of a tree's shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
  /// Live nodes, root included.
  pub nodes: usize,
  pub leaves: usize,
  pub branches: usize,
  /// Branches whose children sit more than one level below them.
  pub compressed_branches: usize,
  /// Live objects, missing ones included.
  pub objects: usize,
  /// Objects currently outside the root.
  pub missing: usize,
  /// Deepest node depth.
  pub deepest: u8,
}

impl TreeStats {
  /// Objects that are linked into some leaf.
  #[inline]
  pub fn placed(&self) -> usize {
    self.objects - self.missing
  }
}
