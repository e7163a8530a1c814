//! Axis-aligned bounding boxes and the dimension-agnostic [`Bounds`] trait.
//!
//! Boxes are stored as center + half-extents. Child cells are produced by
//! halving the extents and offsetting the center by the new half-extent on
//! every axis; bit `i` of the quadrant index selects the positive side of
//! axis `i`:
//!
//! ```text
//! 2D quadrants        3D octants: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
//!   2 | 3
//!  ---+---            0 = (-,-,-) ... 7 = (+,+,+)
//!   0 | 1
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use glam::{Vec2, Vec3};

/// Relative tolerance used when comparing box faces.
pub const INTERSECTION_TOLERANCE: f32 = 1e-6;

/// Capability trait over 2D and 3D boxes.
///
/// Parameterizes trees at compile time, so node records stay flat.
pub trait Bounds: Copy + PartialEq + Debug {
  /// Point / vector type of the dimension.
  type Point: Copy + PartialEq + Debug;

  /// Bit-exact hashable identity of a box.
  type Key: Copy + Eq + Hash + Debug;

  /// Children of a branch: 4 in 2D, 8 in 3D.
  const CHILD_COUNT: usize;

  fn from_center_extents(center: Self::Point, extents: Self::Point) -> Self;

  fn center(&self) -> Self::Point;

  /// Half-size on every axis.
  fn extents(&self) -> Self::Point;

  fn min(&self) -> Self::Point;

  fn max(&self) -> Self::Point;

  /// Inclusive point containment.
  fn contains_point(&self, point: Self::Point) -> bool;

  /// True if every corner of `other` lies inside `self` (inclusive).
  fn contains(&self, other: &Self) -> bool;

  /// Overlap test per axis. Faces that coincide within
  /// [`INTERSECTION_TOLERANCE`] count as intersecting.
  fn intersects(&self, other: &Self) -> bool;

  /// Overlap area (2D) or volume (3D); zero if disjoint on any axis.
  fn intersection_area(&self, other: &Self) -> f32;

  /// One of the `CHILD_COUNT` equal sub-boxes.
  fn child_bounds(&self, quadrant: usize) -> Self;

  /// Box grown by `epsilon` on every axis.
  ///
  /// # Panics
  /// Panics unless `epsilon > 0`.
  fn extended(&self, epsilon: f32) -> Self;

  fn key(&self) -> Self::Key;

  /// Squared distance between the centers of two boxes.
  fn center_distance_squared(&self, other: &Self) -> f32;

  /// Area (2D) or volume (3D) of the box.
  #[inline]
  fn volume(&self) -> f32 {
    self.intersection_area(self)
  }
}

#[inline]
fn faces_meet_2(lo: Vec2, hi: Vec2) -> bool {
  let scale = lo.abs().max(hi.abs()).max(Vec2::ONE);
  (lo - hi).cmple(scale * INTERSECTION_TOLERANCE).all()
}

#[inline]
fn faces_meet_3(lo: Vec3, hi: Vec3) -> bool {
  let scale = lo.abs().max(hi.abs()).max(Vec3::ONE);
  (lo - hi).cmple(scale * INTERSECTION_TOLERANCE).all()
}

#[inline]
fn quadrant_sign(quadrant: usize, axis: usize) -> f32 {
  if quadrant & (1 << axis) != 0 {
    1.0
  } else {
    -1.0
  }
}

// =============================================================================
// Aabb2
// =============================================================================

/// 2D axis-aligned box (quadtree bounds).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
  pub center: Vec2,
  pub extents: Vec2,
}

impl Aabb2 {
  /// Create a box from its center and half-extents.
  ///
  /// # Panics
  /// Debug-asserts non-negative extents.
  pub fn new(center: Vec2, extents: Vec2) -> Self {
    debug_assert!(extents.cmpge(Vec2::ZERO).all(), "extents must be >= 0");
    Self { center, extents }
  }

  /// Create a box from its min and max corners.
  pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
    Self::new((min + max) * 0.5, (max - min) * 0.5)
  }

  /// Degenerate box covering a single point.
  pub fn from_point(point: Vec2) -> Self {
    Self::new(point, Vec2::ZERO)
  }
}

impl Bounds for Aabb2 {
  type Point = Vec2;
  type Key = [u32; 4];

  const CHILD_COUNT: usize = 4;

  #[inline]
  fn from_center_extents(center: Vec2, extents: Vec2) -> Self {
    Self::new(center, extents)
  }

  #[inline]
  fn center(&self) -> Vec2 {
    self.center
  }

  #[inline]
  fn extents(&self) -> Vec2 {
    self.extents
  }

  #[inline]
  fn min(&self) -> Vec2 {
    self.center - self.extents
  }

  #[inline]
  fn max(&self) -> Vec2 {
    self.center + self.extents
  }

  #[inline]
  fn contains_point(&self, point: Vec2) -> bool {
    point.cmpge(self.min()).all() && point.cmple(self.max()).all()
  }

  #[inline]
  fn contains(&self, other: &Self) -> bool {
    other.min().cmpge(self.min()).all() && other.max().cmple(self.max()).all()
  }

  #[inline]
  fn intersects(&self, other: &Self) -> bool {
    faces_meet_2(self.min().max(other.min()), self.max().min(other.max()))
  }

  #[inline]
  fn intersection_area(&self, other: &Self) -> f32 {
    let overlap = self.max().min(other.max()) - self.min().max(other.min());
    if overlap.cmple(Vec2::ZERO).any() {
      0.0
    } else {
      overlap.element_product()
    }
  }

  fn child_bounds(&self, quadrant: usize) -> Self {
    debug_assert!(quadrant < Self::CHILD_COUNT, "quadrant {quadrant} out of range");
    let extents = self.extents * 0.5;
    let sign = Vec2::new(quadrant_sign(quadrant, 0), quadrant_sign(quadrant, 1));
    Self::new(self.center + sign * extents, extents)
  }

  fn extended(&self, epsilon: f32) -> Self {
    assert!(epsilon > 0.0, "epsilon must be > 0, got {epsilon}");
    Self::new(self.center, self.extents + Vec2::splat(epsilon))
  }

  #[inline]
  fn key(&self) -> [u32; 4] {
    [
      self.center.x.to_bits(),
      self.center.y.to_bits(),
      self.extents.x.to_bits(),
      self.extents.y.to_bits(),
    ]
  }

  #[inline]
  fn center_distance_squared(&self, other: &Self) -> f32 {
    self.center.distance_squared(other.center)
  }
}

// =============================================================================
// Aabb3
// =============================================================================

/// 3D axis-aligned box (octree bounds).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
  pub center: Vec3,
  pub extents: Vec3,
}

impl Aabb3 {
  /// Create a box from its center and half-extents.
  ///
  /// # Panics
  /// Debug-asserts non-negative extents.
  pub fn new(center: Vec3, extents: Vec3) -> Self {
    debug_assert!(extents.cmpge(Vec3::ZERO).all(), "extents must be >= 0");
    Self { center, extents }
  }

  /// Create a box from its min and max corners.
  pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
    Self::new((min + max) * 0.5, (max - min) * 0.5)
  }

  /// Degenerate box covering a single point.
  pub fn from_point(point: Vec3) -> Self {
    Self::new(point, Vec3::ZERO)
  }
}

impl Bounds for Aabb3 {
  type Point = Vec3;
  type Key = [u32; 6];

  const CHILD_COUNT: usize = 8;

  #[inline]
  fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
    Self::new(center, extents)
  }

  #[inline]
  fn center(&self) -> Vec3 {
    self.center
  }

  #[inline]
  fn extents(&self) -> Vec3 {
    self.extents
  }

  #[inline]
  fn min(&self) -> Vec3 {
    self.center - self.extents
  }

  #[inline]
  fn max(&self) -> Vec3 {
    self.center + self.extents
  }

  #[inline]
  fn contains_point(&self, point: Vec3) -> bool {
    point.cmpge(self.min()).all() && point.cmple(self.max()).all()
  }

  #[inline]
  fn contains(&self, other: &Self) -> bool {
    other.min().cmpge(self.min()).all() && other.max().cmple(self.max()).all()
  }

  #[inline]
  fn intersects(&self, other: &Self) -> bool {
    faces_meet_3(self.min().max(other.min()), self.max().min(other.max()))
  }

  #[inline]
  fn intersection_area(&self, other: &Self) -> f32 {
    let overlap = self.max().min(other.max()) - self.min().max(other.min());
    if overlap.cmple(Vec3::ZERO).any() {
      0.0
    } else {
      overlap.element_product()
    }
  }

  fn child_bounds(&self, octant: usize) -> Self {
    debug_assert!(octant < Self::CHILD_COUNT, "octant {octant} out of range");
    let extents = self.extents * 0.5;
    let sign = Vec3::new(
      quadrant_sign(octant, 0),
      quadrant_sign(octant, 1),
      quadrant_sign(octant, 2),
    );
    Self::new(self.center + sign * extents, extents)
  }

  fn extended(&self, epsilon: f32) -> Self {
    assert!(epsilon > 0.0, "epsilon must be > 0, got {epsilon}");
    Self::new(self.center, self.extents + Vec3::splat(epsilon))
  }

  #[inline]
  fn key(&self) -> [u32; 6] {
    [
      self.center.x.to_bits(),
      self.center.y.to_bits(),
      self.center.z.to_bits(),
      self.extents.x.to_bits(),
      self.extents.y.to_bits(),
      self.extents.z.to_bits(),
    ]
  }

  #[inline]
  fn center_distance_squared(&self, other: &Self) -> f32 {
    self.center.distance_squared(other.center)
  }
}

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;
