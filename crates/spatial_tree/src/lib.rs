//! spatial_tree - dynamic quadtree/octree spatial index for moving objects
//!
//! Maps axis-aligned bounding boxes of static or moving objects onto a
//! hierarchical subdivision of space. Three flavours share one arena-backed
//! core; pick exactly one per index:
//!
//! - [`Tree`]: bucketed quadtree/octree with deferred merging
//! - [`CompressedTree`]: collapses single-child chains of empty branches and
//!   re-expands them lazily on insertion
//! - [`SkipTree`]: several compressed trees at thinning resolutions, linked
//!   across levels to answer epsilon-approximate range queries
//!
//! Dimension is chosen at compile time through the [`Bounds`] trait:
//! [`Aabb2`] gives a quadtree (4 children), [`Aabb3`] an octree (8 children).
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use spatial_tree::{Aabb2, SkipTree, SkipTreeConfig, TreeConfig};
//!
//! # fn main() -> Result<(), spatial_tree::ConfigError> {
//! let world = Aabb2::new(Vec2::ZERO, Vec2::splat(100.0));
//! let config = SkipTreeConfig::new(TreeConfig::new(world).with_max_leaf_objects(4))
//!   .with_levels(4)
//!   .with_seed(7);
//! let mut tree = SkipTree::new(config)?;
//!
//! let handle = tree.try_add("crate", Aabb2::new(Vec2::new(10.0, 10.0), Vec2::ONE)).unwrap();
//! tree.update(handle, Aabb2::new(Vec2::new(12.0, 10.0), Vec2::ONE));
//!
//! let mut hits = Vec::new();
//! tree.approximate_query(&Aabb2::new(Vec2::new(12.0, 10.0), Vec2::splat(3.0)), 0.5, &mut hits);
//! assert_eq!(hits, vec!["crate"]);
//! # Ok(())
//! # }
//! ```

pub mod arena;
pub mod bounds;
pub mod config;
pub mod node;
pub mod stats;

// Base tree, traversal engine and clean-up
pub mod tree;
pub use tree::{ObjectChain, Tree, Visit, Walk, ROOT};

// Path-compressed flavour
pub mod compressed;
pub use compressed::CompressedTree;

// Multi-resolution flavour with approximate queries
pub mod skip;
pub use skip::{ApproximateStats, SkipTree};

// Re-export commonly used items
pub use arena::SlotArena;
pub use bounds::{Aabb2, Aabb3, Bounds};
pub use config::{ConfigError, SkipTreeConfig, TreeConfig, MAX_DEPTH, MAX_LEVELS};
pub use node::{Node, NodeObject};
pub use stats::TreeStats;
