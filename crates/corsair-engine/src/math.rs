//! Small 2D value types in tile units.
//!
//! The y axis grows downward: row 0 is the top of the map, so a positive
//! vertical velocity means falling.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D vector of `f32` tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component (down is positive).
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Construct a vector from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both components are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// An axis-aligned box in world tile units. `min` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Aabb {
    /// Construct a box from its corners.
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Whether this box overlaps `other` by more than `eps` on both axes.
    pub fn overlaps(&self, other: &Aabb, eps: f32) -> bool {
        self.min.x < other.max.x - eps
            && other.min.x < self.max.x - eps
            && self.min.y < other.max.y - eps
            && other.min.y < self.max.y - eps
    }

    /// The unit box covering tile `(tx, ty)`.
    pub fn tile(tx: i32, ty: i32) -> Aabb {
        let min = Vec2::new(tx as f32, ty as f32);
        Aabb::new(min, Vec2::new(min.x + 1.0, min.y + 1.0))
    }
}

// ---------------------------------------------------------------------------
// Mask
// ---------------------------------------------------------------------------

/// A collision mask: box offsets relative to an entity's logical position.
///
/// `tl` must be strictly above and to the left of `br`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    /// Offset of the top-left corner.
    pub tl: Vec2,
    /// Offset of the bottom-right corner.
    pub br: Vec2,
}

impl Mask {
    pub const fn new(tl: Vec2, br: Vec2) -> Self {
        Self { tl, br }
    }

    pub fn width(&self) -> f32 {
        self.br.x - self.tl.x
    }

    pub fn height(&self) -> f32 {
        self.br.y - self.tl.y
    }

    /// The world-space box of this mask placed at `pos`.
    pub fn at(&self, pos: Vec2) -> Aabb {
        debug_assert!(
            self.width() > 0.0 && self.height() > 0.0,
            "collision mask must have positive area: {self:?}"
        );
        Aabb::new(pos + self.tl, pos + self.br)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_places_box_relative_to_position() {
        let mask = Mask::new(Vec2::new(0.25, 0.0), Vec2::new(0.75, 1.0));
        let b = mask.at(Vec2::new(3.0, 2.0));
        assert_eq!(b.min, Vec2::new(3.25, 2.0));
        assert_eq!(b.max, Vec2::new(3.75, 3.0));
        assert_eq!(b.center(), Vec2::new(3.5, 2.5));
        assert_eq!(mask.width(), 0.5);
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb::tile(0, 0);
        let b = Aabb::tile(1, 0);
        assert!(!a.overlaps(&b, 0.0));
        assert!(a.overlaps(&Aabb::tile(0, 0), 0.0));
    }

    #[test]
    fn non_finite_vectors_are_detected() {
        assert!(Vec2::new(1.0, -2.0).is_finite());
        assert!(!Vec2::new(f32::NAN, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f32::INFINITY).is_finite());
    }
}
