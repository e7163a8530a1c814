//! Node and object records stored in the tree arenas.
//!
//! Links are arena indices, never references: the tree owns every record and
//! parent/child/chain links form a controlled cyclic graph over the arenas.

/// Tree node record.
///
/// A branch owns exactly `B::CHILD_COUNT` children allocated contiguously
/// starting at its first child. A leaf instead heads an intrusive chain of
/// objects; both uses share the `head` link.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<B> {
  pub(crate) parent: Option<usize>,
  /// First child for a branch, first object for a leaf.
  pub(crate) head: Option<usize>,
  pub(crate) objects_count: usize,
  pub(crate) is_leaf: bool,
  pub(crate) depth: u8,
  pub(crate) bounds: B,
}

impl<B> Node<B> {
  /// Create an empty leaf.
  pub(crate) fn leaf(parent: Option<usize>, depth: u8, bounds: B) -> Self {
    Self {
      parent,
      head: None,
      objects_count: 0,
      is_leaf: true,
      depth,
      bounds,
    }
  }

  #[inline]
  pub fn parent(&self) -> Option<usize> {
    self.parent
  }

  /// First of the contiguous children; `None` for leaves.
  #[inline]
  pub fn first_child(&self) -> Option<usize> {
    if self.is_leaf {
      None
    } else {
      self.head
    }
  }

  /// Head of the object chain; `None` for branches and empty leaves.
  #[inline]
  pub fn first_object(&self) -> Option<usize> {
    if self.is_leaf {
      self.head
    } else {
      None
    }
  }

  /// Length of the object chain (always 0 for branches).
  #[inline]
  pub fn objects_count(&self) -> usize {
    self.objects_count
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.is_leaf
  }

  /// Distance from the root (root = 0).
  #[inline]
  pub fn depth(&self) -> u8 {
    self.depth
  }

  #[inline]
  pub fn bounds(&self) -> &B {
    &self.bounds
  }
}

/// Object stored in a leaf chain.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeObject<T, B> {
  /// Owning leaf; `None` while the object is missing (outside the root).
  pub(crate) leaf: Option<usize>,
  pub(crate) target: T,
  pub(crate) bounds: B,
  pub(crate) next: Option<usize>,
}

impl<T, B> NodeObject<T, B> {
  pub(crate) fn detached(target: T, bounds: B) -> Self {
    Self {
      leaf: None,
      target,
      bounds,
      next: None,
    }
  }

  #[inline]
  pub fn leaf(&self) -> Option<usize> {
    self.leaf
  }

  #[inline]
  pub fn target(&self) -> &T {
    &self.target
  }

  #[inline]
  pub fn bounds(&self) -> &B {
    &self.bounds
  }

  /// Next object in the same leaf chain.
  #[inline]
  pub fn next(&self) -> Option<usize> {
    self.next
  }
}
