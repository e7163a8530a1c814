//! Skip tree: compressed trees over the same domain at thinning densities.
//!
//! Level 0 holds every object. An object present at level `i` is also
//! stored at level `i + 1` with the configured promotion probability, so
//! each level is on average a fixed fraction of the one below. Branches
//! with bit-equal bounds on adjacent levels are linked, letting the
//! approximate query skip through sparse levels instead of walking every
//! level-0 node on the way down.

mod approximate;
mod links;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::{smallvec, SmallVec};

pub use approximate::ApproximateStats;

use crate::arena::SlotArena;
use crate::bounds::Bounds;
use crate::compressed::CompressedTree;
use crate::config::{ConfigError, SkipTreeConfig, MAX_LEVELS};
use crate::node::Node;
use crate::stats::TreeStats;
use links::LevelLinks;

/// Object indices at each level an object reached, level 0 first.
type LevelEntries = SmallVec<[usize; MAX_LEVELS]>;

/// Multi-resolution tree answering epsilon-approximate range queries.
///
/// Objects are addressed by handles owned by the skip tree; a handle stays
/// valid until the object is removed.
pub struct SkipTree<T, B> {
  base: CompressedTree<T, B>,
  /// Levels 1.. store the object's handle; only level 0 answers queries.
  upper: Vec<CompressedTree<usize, B>>,
  entries: SlotArena<LevelEntries>,
  /// `links[i]` joins level `i` and level `i + 1`.
  links: Vec<LevelLinks>,
  rng: StdRng,
  promotion_probability: f64,
}

impl<T, B: Bounds> SkipTree<T, B> {
  pub fn new(config: SkipTreeConfig<B>) -> Result<Self, ConfigError> {
    config.validate()?;

    let base = CompressedTree::new(config.tree.clone())?;
    let upper = (1..config.levels)
      .map(|_| CompressedTree::new(config.tree.clone()))
      .collect::<Result<Vec<_>, _>>()?;
    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_os_rng(),
    };

    Ok(Self {
      base,
      upper,
      entries: SlotArena::with_capacity(config.tree.initial_objects_capacity),
      links: vec![LevelLinks::default(); config.levels - 1],
      rng,
      promotion_probability: config.promotion_probability,
    })
  }

  // ===========================================================================
  // Accessors
  // ===========================================================================

  /// Level 0, holding every object.
  #[inline]
  pub fn base(&self) -> &CompressedTree<T, B> {
    &self.base
  }

  #[inline]
  pub fn level_count(&self) -> usize {
    self.upper.len() + 1
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[inline]
  pub fn contains(&self, handle: usize) -> bool {
    self.entries.contains(handle)
  }

  pub fn get(&self, handle: usize) -> Option<&T> {
    self.entries.get(handle).and_then(|entry| self.base.get(entry[0]))
  }

  pub fn get_mut(&mut self, handle: usize) -> Option<&mut T> {
    let index = self.entries.get(handle)?[0];
    self.base.get_mut(index)
  }

  pub fn bounds_of(&self, handle: usize) -> Option<&B> {
    self.entries.get(handle).and_then(|entry| self.base.bounds_of(entry[0]))
  }

  pub fn is_missing(&self, handle: usize) -> bool {
    self
      .entries
      .get(handle)
      .is_some_and(|entry| self.base.is_missing(entry[0]))
  }

  /// Number of levels holding the object (at least 1).
  pub fn levels_of(&self, handle: usize) -> Option<usize> {
    self.entries.get(handle).map(|entry| entry.len())
  }

  /// Shape of every level, level 0 first.
  pub fn level_stats(&self) -> Vec<TreeStats> {
    std::iter::once(self.base.stats())
      .chain(self.upper.iter().map(CompressedTree::stats))
      .collect()
  }

  /// Twin on `level + 1` of branch `node` on `level`.
  pub fn link_up(&self, level: usize, node: usize) -> Option<usize> {
    self.links.get(level).and_then(|links| links.up(node))
  }

  /// Twin on `level - 1` of branch `node` on `level`.
  pub fn link_down(&self, level: usize, node: usize) -> Option<usize> {
    let below = level.checked_sub(1)?;
    self.links.get(below).and_then(|links| links.down(node))
  }

  /// Node arena of one level.
  ///
  /// # Panics
  /// Panics if `level >= level_count()`.
  pub fn level_nodes(&self, level: usize) -> &SlotArena<Node<B>> {
    match level {
      0 => &self.base.as_tree().nodes,
      _ => &self.upper[level - 1].as_tree().nodes,
    }
  }

  fn level_revision(&self, level: usize) -> u64 {
    match level {
      0 => self.base.revision(),
      _ => self.upper[level - 1].revision(),
    }
  }

  // ===========================================================================
  // Mutation
  // ===========================================================================

  /// Insert `target` at level 0 and promote it upward by coin flips.
  /// Returns its handle, or `None` if `bounds` misses the root.
  pub fn try_add(&mut self, target: T, bounds: B) -> Option<usize> {
    let base_index = self.base.try_add(target, bounds)?;
    let handle = self.entries.add(smallvec![base_index]);

    for level in &mut self.upper {
      if !self.rng.random_bool(self.promotion_probability) {
        break;
      }
      match level.try_add(handle, bounds) {
        Some(index) => self.entries[handle].push(index),
        None => break,
      }
    }

    self.refresh_links();
    Some(handle)
  }

  pub fn try_remove(&mut self, handle: usize) -> Option<T> {
    if !self.entries.contains(handle) {
      return None;
    }
    let entry = self.entries.remove_at(handle);
    for (level, &index) in self.upper.iter_mut().zip(&entry[1..]) {
      level.remove(index);
    }
    self.base.try_remove(entry[0])
  }

  /// # Panics
  /// Panics if `handle` is not live.
  pub fn remove(&mut self, handle: usize) -> T {
    self
      .try_remove(handle)
      .unwrap_or_else(|| panic!("object {handle} is not live"))
  }

  /// Move an object on every level it occupies, returning its handle.
  ///
  /// # Panics
  /// Panics if `handle` is not live.
  pub fn update(&mut self, handle: usize, bounds: B) -> usize {
    let entry = self
      .entries
      .get(handle)
      .unwrap_or_else(|| panic!("object {handle} is not live"));

    self.base.update(entry[0], bounds);
    for (level, &index) in self.upper.iter_mut().zip(&entry[1..]) {
      level.update(index, bounds);
    }

    self.refresh_links();
    handle
  }

  /// Clean up every level; returns the total number of merged branches.
  pub fn clean_up(&mut self) -> usize {
    let merged = self.base.clean_up() + self.upper.iter_mut().map(CompressedTree::clean_up).sum::<usize>();
    self.refresh_links();
    merged
  }

  /// Exact range query, answered by level 0.
  pub fn query(&self, bounds: &B, results: &mut Vec<T>)
  where
    T: Clone,
  {
    self.base.query(bounds, results);
  }

  /// Rebuild the links of every level pair whose trees changed shape.
  fn refresh_links(&mut self) {
    for level in 0..self.links.len() {
      let revisions = (self.level_revision(level), self.level_revision(level + 1));
      if self.links[level].is_current(revisions) {
        continue;
      }
      let links = LevelLinks::build(self.level_nodes(level), self.level_nodes(level + 1), revisions);
      #[cfg(feature = "tracing")]
      tracing::debug!(level, links = links.len(), "rebuilt level links");
      self.links[level] = links;
    }
  }
}
