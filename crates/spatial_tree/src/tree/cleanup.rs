//! Deferred merging of sparse branches.
//!
//! Removal never merges eagerly. `clean_up` collapses every branch whose
//! children are all leaves holding no more than `max_leaf_objects` objects
//! in total, and repeats until a pass changes nothing.

use smallvec::SmallVec;

use super::{Tree, Walk, ROOT};
use crate::bounds::Bounds;

/// Running tally for the sibling group being visited.
#[derive(Clone, Copy, Default)]
struct SiblingGroup {
  mergeable: bool,
  objects: usize,
}

impl<T, B: Bounds> Tree<T, B> {
  /// Collapse sparse branches until a fixed point; returns the number of
  /// branches merged.
  #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, name = "tree::clean_up"))]
  pub fn clean_up(&mut self) -> usize {
    let mut merged = 0;
    loop {
      let candidates = self.merge_candidates();
      if candidates.is_empty() {
        break;
      }
      for parent in candidates {
        self.merge_children(parent);
        merged += 1;
      }
    }

    #[cfg(feature = "tracing")]
    if merged > 0 {
      tracing::debug!(merged, nodes = self.nodes.len(), "collapsed branches");
    }
    merged
  }

  /// Branches whose children are all leaves and fit in one leaf.
  ///
  /// Siblings are visited back to back, so a group is complete when its
  /// last sibling is reached without the parent having changed in between.
  fn merge_candidates(&self) -> Vec<usize> {
    let mut candidates = Vec::new();
    let mut group = SiblingGroup::default();

    self.traverse(ROOT, |node, visit| {
      if visit.parent_changed {
        let first_sibling = node.parent.and_then(|parent| self.nodes[parent].first_child());
        group = SiblingGroup {
          mergeable: first_sibling == Some(visit.index),
          objects: 0,
        };
      }

      if node.is_leaf {
        group.objects += node.objects_count;
      } else {
        group.mergeable = false;
      }

      if visit.last_sibling && group.mergeable && group.objects <= self.max_leaf_objects {
        candidates.extend(node.parent);
      }
      Walk::Continue
    });

    candidates
  }

  /// Move the children's objects onto `parent` and delete the children.
  pub(crate) fn merge_children(&mut self, parent: usize) {
    let Some(first) = self.nodes[parent].first_child() else {
      return;
    };

    let mut moved: SmallVec<[usize; 16]> = SmallVec::new();
    for child in first..first + B::CHILD_COUNT {
      moved.extend(self.objects_in(child).map(|(index, _)| index));
    }
    for &index in &moved {
      let object = &mut self.objects[index];
      object.leaf = None;
      object.next = None;
    }

    self.delete_children_of(parent);
    for index in moved {
      self.link(parent, index);
    }
  }
}

#[cfg(test)]
#[path = "cleanup_test.rs"]
mod cleanup_test;
