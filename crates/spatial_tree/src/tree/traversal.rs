//! Generic depth-first traversal with pruning signals.

use smallvec::{smallvec, SmallVec};

use super::Tree;
use crate::bounds::Bounds;
use crate::node::Node;

/// What the traversal does after visiting a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
  /// Visit this node's children, then carry on with pending siblings.
  Continue,
  /// Do not descend into this node.
  Skip,
  /// Drop every pending sibling and descend into this node only.
  ContinueInDepth,
  /// Abort the traversal.
  Stop,
}

/// Position of a visited node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visit {
  pub index: usize,
  /// Parent differs from the previously visited node's parent.
  pub parent_changed: bool,
  /// Node is the last of its sibling group (always true for the start node
  /// if it is the root).
  pub last_sibling: bool,
}

impl<T, B: Bounds> Tree<T, B> {
  /// Pre-order walk from `start`; children are visited in quadrant order.
  pub fn traverse<F>(&self, start: usize, mut visitor: F)
  where
    F: FnMut(&Node<B>, Visit) -> Walk,
  {
    let mut stack: SmallVec<[usize; 64]> = smallvec![start];
    let mut previous_parent = None;

    while let Some(index) = stack.pop() {
      let node = &self.nodes[index];
      let parent_changed = previous_parent != Some(node.parent);
      previous_parent = Some(node.parent);

      let last_sibling = match node.parent.and_then(|parent| self.nodes[parent].first_child()) {
        Some(first) => index == first + B::CHILD_COUNT - 1,
        None => true,
      };

      let visit = Visit {
        index,
        parent_changed,
        last_sibling,
      };
      match visitor(node, visit) {
        Walk::Continue => push_children(node, &mut stack, B::CHILD_COUNT),
        Walk::Skip => {}
        Walk::ContinueInDepth => {
          stack.clear();
          push_children(node, &mut stack, B::CHILD_COUNT);
        }
        Walk::Stop => return,
      }
    }
  }
}

#[inline]
fn push_children<B>(node: &Node<B>, stack: &mut SmallVec<[usize; 64]>, count: usize) {
  if let Some(first) = node.first_child() {
    stack.extend((first..first + count).rev());
  }
}

#[cfg(test)]
#[path = "traversal_test.rs"]
mod traversal_test;
