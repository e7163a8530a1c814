//! SlotArena - index-stable storage with slot recycling.
//!
//! Backing store for tree nodes and node objects. Indices handed out by the
//! arena keep naming the same item until that item is removed; removal never
//! compacts the array, it only queues the slot for reuse.

use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

/// Growable array of slots plus a queue of freed slot runs.
///
/// Freed slots are recycled oldest first. Runs freed together through
/// [`remove_run`](Self::remove_run) stay together, so contiguous groups
/// (sibling nodes) can be reallocated in one piece.
#[derive(Clone, Debug)]
pub struct SlotArena<T> {
  slots: Vec<Option<T>>,
  /// Freed runs as `(start, len)`.
  free: VecDeque<(usize, usize)>,
  live: usize,
}

impl<T> SlotArena<T> {
  /// Create an empty arena.
  pub fn new() -> Self {
    Self::with_capacity(0)
  }

  /// Create an empty arena with room for `capacity` items before growing.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      slots: Vec::with_capacity(capacity),
      free: VecDeque::new(),
      live: 0,
    }
  }

  /// Number of live items.
  #[inline]
  pub fn len(&self) -> usize {
    self.live
  }

  /// True when no item is live.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.live == 0
  }

  /// Number of slots ever allocated (live or free).
  #[inline]
  pub fn slot_count(&self) -> usize {
    self.slots.len()
  }

  /// Store `item`, returning a recycled or freshly allocated index.
  pub fn add(&mut self, item: T) -> usize {
    let index = match self.free.pop_front() {
      Some((start, run)) => {
        if run > 1 {
          self.free.push_front((start + 1, run - 1));
        }
        start
      }
      None => {
        self.slots.push(None);
        self.slots.len() - 1
      }
    };

    debug_assert!(self.slots[index].is_none(), "recycled slot {index} is live");
    self.slots[index] = Some(item);
    self.live += 1;
    index
  }

  /// Store every item of `items` in consecutive slots, returning the first
  /// index.
  ///
  /// # Panics
  /// Panics if `items` is empty.
  pub fn add_run<I>(&mut self, items: I) -> usize
  where
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator,
  {
    let items = items.into_iter();
    let count = items.len();
    assert!(count > 0, "cannot allocate an empty run");

    let start = match self.free.iter().position(|&(_, run)| run >= count) {
      Some(position) => {
        let (start, run) = self.free[position];
        if run == count {
          self.free.remove(position);
        } else {
          self.free[position] = (start + count, run - count);
        }
        start
      }
      None => {
        let start = self.slots.len();
        self.slots.resize_with(start + count, || None);
        start
      }
    };

    for (offset, item) in items.enumerate() {
      debug_assert!(self.slots[start + offset].is_none());
      self.slots[start + offset] = Some(item);
    }
    self.live += count;
    start
  }

  /// Remove and return the item at `index`, queueing the slot for reuse.
  ///
  /// # Panics
  /// Panics if `index` is out of range or already free.
  pub fn remove_at(&mut self, index: usize) -> T {
    let item = self
      .slots
      .get_mut(index)
      .and_then(Option::take)
      .unwrap_or_else(|| panic!("slot {index} is not live"));
    self.free.push_back((index, 1));
    self.live -= 1;
    item
  }

  /// Remove `count` consecutive items starting at `start` as one reusable run.
  ///
  /// # Panics
  /// Panics if any slot of the run is not live.
  pub fn remove_run(&mut self, start: usize, count: usize) {
    for index in start..start + count {
      let freed = self.slots.get_mut(index).and_then(Option::take);
      assert!(freed.is_some(), "slot {index} is not live");
    }
    self.free.push_back((start, count));
    self.live -= count;
  }

  /// Whether `index` currently names a live item.
  #[inline]
  pub fn contains(&self, index: usize) -> bool {
    matches!(self.slots.get(index), Some(Some(_)))
  }

  #[inline]
  pub fn get(&self, index: usize) -> Option<&T> {
    self.slots.get(index).and_then(Option::as_ref)
  }

  #[inline]
  pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
    self.slots.get_mut(index).and_then(Option::as_mut)
  }

  /// Iterate live items with their indices, in index order.
  pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
    self
      .slots
      .iter()
      .enumerate()
      .filter_map(|(index, slot)| slot.as_ref().map(|item| (index, item)))
  }
}

impl<T> Default for SlotArena<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Index<usize> for SlotArena<T> {
  type Output = T;

  #[inline]
  fn index(&self, index: usize) -> &T {
    self
      .get(index)
      .unwrap_or_else(|| panic!("slot {index} is not live"))
  }
}

impl<T> IndexMut<usize> for SlotArena<T> {
  #[inline]
  fn index_mut(&mut self, index: usize) -> &mut T {
    self
      .get_mut(index)
      .unwrap_or_else(|| panic!("slot {index} is not live"))
  }
}

#[cfg(test)]
#[path = "arena_test.rs"]
mod arena_test;
