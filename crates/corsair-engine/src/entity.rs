//! The entity record and its status flags.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationState;
use crate::kind::{EntityKind, KindMeta};
use crate::math::{Aabb, Vec2};

/// Status bits of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusFlags(u8);

impl StatusFlags {
    pub const NONE: StatusFlags = StatusFlags(0);
    /// Sprite faces left.
    pub const FLIPPED: StatusFlags = StatusFlags(1 << 0);
    /// The last vertical pass ended on a floor.
    pub const GROUNDED: StatusFlags = StatusFlags(1 << 1);
    /// The last vertical pass hit a ceiling while rising.
    pub const CEILING_HIT: StatusFlags = StatusFlags(1 << 2);

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: StatusFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: StatusFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: StatusFlags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: StatusFlags, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl std::ops::BitOr for StatusFlags {
    type Output = StatusFlags;

    fn bitor(self, rhs: StatusFlags) -> StatusFlags {
        StatusFlags(self.0 | rhs.0)
    }
}

/// Integer tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

/// One simulated entity.
///
/// `pos` is the top-left of the entity's logical tile cell; the collision
/// box is the kind's mask placed at `pos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Velocity in tiles/s.
    pub vel: Vec2,
    pub flags: StatusFlags,
    pub health: i32,
    /// Tile whose marker spawned this entity.
    pub spawn: TileCoord,
    pub anim: AnimationState,
}

impl Entity {
    /// A fresh entity of `kind` standing in tile `(tx, ty)`.
    pub fn new(kind: EntityKind, tx: i32, ty: i32) -> Self {
        let meta = kind.meta();
        Self {
            kind,
            pos: Vec2::new(tx as f32, ty as f32),
            vel: Vec2::ZERO,
            flags: StatusFlags::NONE,
            health: meta.max_health,
            spawn: TileCoord { x: tx, y: ty },
            anim: AnimationState::new(meta.default_animation),
        }
    }

    pub fn meta(&self) -> &'static KindMeta {
        self.kind.meta()
    }

    /// World-space collision box.
    pub fn bounds(&self) -> Aabb {
        self.meta().mask.at(self.pos)
    }

    pub fn is_grounded(&self) -> bool {
        self.flags.contains(StatusFlags::GROUNDED)
    }

    pub fn is_flipped(&self) -> bool {
        self.flags.contains(StatusFlags::FLIPPED)
    }

    /// Face the direction of horizontal motion; stationary keeps the facing.
    pub fn face_motion(&mut self) {
        if self.vel.x < 0.0 {
            self.flags.insert(StatusFlags::FLIPPED);
        } else if self.vel.x > 0.0 {
            self.flags.remove(StatusFlags::FLIPPED);
        }
    }
}
