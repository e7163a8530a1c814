use super::*;

// =========================================================================
// SlotArena: allocation and recycling
// =========================================================================

/// Fresh arena hands out consecutive indices.
#[test]
fn test_add_returns_consecutive_indices() {
  let mut arena = SlotArena::new();
  assert_eq!(arena.add("a"), 0);
  assert_eq!(arena.add("b"), 1);
  assert_eq!(arena.add("c"), 2);
  assert_eq!(arena.len(), 3);
}

/// Removing an item does not shift the others.
#[test]
fn test_remove_keeps_other_indices_stable() {
  let mut arena = SlotArena::new();
  let a = arena.add(10);
  let b = arena.add(20);
  let c = arena.add(30);

  assert_eq!(arena.remove_at(b), 20);

  assert!(arena.contains(a));
  assert!(!arena.contains(b), "Removed index must not be live");
  assert!(arena.contains(c));
  assert_eq!(arena[a], 10);
  assert_eq!(arena[c], 30);
  assert_eq!(arena.len(), 2);
}

/// Freed slots are reused before the array grows.
#[test]
fn test_freed_slot_is_recycled() {
  let mut arena = SlotArena::new();
  arena.add(1);
  let freed = arena.add(2);
  arena.add(3);
  arena.remove_at(freed);

  let reused = arena.add(4);
  assert_eq!(reused, freed, "Freed slot should be recycled");
  assert_eq!(arena.slot_count(), 3, "Array should not grow");
  assert_eq!(arena[reused], 4);
}

/// Freed slots come back in the order they were released.
#[test]
fn test_recycling_is_fifo() {
  let mut arena = SlotArena::new();
  for value in 0..5 {
    arena.add(value);
  }
  arena.remove_at(3);
  arena.remove_at(1);

  assert_eq!(arena.add(100), 3);
  assert_eq!(arena.add(101), 1);
  assert_eq!(arena.add(102), 5);
}

/// Growth past the initial capacity preserves existing items.
#[test]
fn test_growth_preserves_items() {
  let mut arena = SlotArena::with_capacity(2);
  let indices: Vec<_> = (0..100).map(|value| arena.add(value)).collect();

  for (value, index) in indices.into_iter().enumerate() {
    assert_eq!(arena[index], value);
  }
}

// =========================================================================
// SlotArena: contiguous runs
// =========================================================================

/// A run occupies consecutive slots.
#[test]
fn test_add_run_is_contiguous() {
  let mut arena = SlotArena::new();
  arena.add('x');
  let start = arena.add_run(['a', 'b', 'c', 'd']);

  assert_eq!(start, 1);
  for (offset, expected) in ['a', 'b', 'c', 'd'].into_iter().enumerate() {
    assert_eq!(arena[start + offset], expected);
  }
}

/// A freed run is reused whole by the next run of the same size.
#[test]
fn test_freed_run_is_reused_by_run() {
  let mut arena = SlotArena::new();
  arena.add(0);
  let first = arena.add_run([1, 2, 3, 4]);
  arena.add_run([5, 6, 7, 8]);

  arena.remove_run(first, 4);
  assert_eq!(arena.len(), 5);

  let again = arena.add_run([9, 9, 9, 9]);
  assert_eq!(again, first, "Run should land in the freed run");
  assert_eq!(arena.slot_count(), 9);
}

/// Single slots are not stitched together into a run.
#[test]
fn test_scattered_single_slots_do_not_form_run() {
  let mut arena = SlotArena::new();
  for value in 0..4 {
    arena.add(value);
  }
  arena.remove_at(1);
  arena.remove_at(2);

  let start = arena.add_run([7, 7]);
  assert_eq!(start, 4, "Two separately freed slots are not a run");
}

/// Single allocations may consume a freed run slot by slot.
#[test]
fn test_single_add_splits_run() {
  let mut arena = SlotArena::new();
  let start = arena.add_run([0, 0, 0, 0]);
  arena.remove_run(start, 4);

  assert_eq!(arena.add(1), start);
  assert_eq!(arena.add(2), start + 1);
  assert_eq!(arena.add_run([3, 3]), start + 2);
  assert_eq!(arena.slot_count(), 4);
}

/// Iteration skips free slots.
#[test]
fn test_iter_skips_free_slots() {
  let mut arena = SlotArena::new();
  for value in 0..4 {
    arena.add(value * 10);
  }
  arena.remove_at(2);

  let live: Vec<_> = arena.iter().map(|(index, value)| (index, *value)).collect();
  assert_eq!(live, vec![(0, 0), (1, 10), (3, 30)]);
}

// =========================================================================
// SlotArena: contract violations
// =========================================================================

#[test]
#[should_panic(expected = "not live")]
fn test_remove_twice_panics() {
  let mut arena = SlotArena::new();
  let index = arena.add(1);
  arena.remove_at(index);
  arena.remove_at(index);
}

#[test]
#[should_panic(expected = "not live")]
fn test_index_out_of_range_panics() {
  let arena: SlotArena<u8> = SlotArena::new();
  let _ = arena[3];
}

#[test]
fn test_get_on_free_slot_is_none() {
  let mut arena = SlotArena::new();
  let index = arena.add(1);
  arena.remove_at(index);
  assert!(arena.get(index).is_none());
  assert!(arena.get(42).is_none());
}
