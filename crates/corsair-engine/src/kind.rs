//! Entity kinds and their shared, immutable metadata.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationId;
use crate::math::{Mask, Vec2};
use crate::tiles::TileId;

/// The closed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player-controlled pirate.
    Captain,
    /// A patrolling crab that charges the player on sight.
    Crabby,
}

/// Per-kind constants shared by every entity of that kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindMeta {
    /// Collision box relative to the entity position.
    pub mask: Mask,
    /// Animation active right after spawn.
    pub default_animation: AnimationId,
    /// Health on spawn.
    pub max_health: i32,
    /// Tile that spawns this kind at level start and is restored on destroy.
    pub marker: TileId,
}

static CAPTAIN: KindMeta = KindMeta {
    mask: Mask::new(Vec2::new(0.25, 0.125), Vec2::new(0.75, 1.0)),
    default_animation: AnimationId::CaptainIdle,
    max_health: 3,
    marker: TileId::CAPTAIN,
};

static CRABBY: KindMeta = KindMeta {
    mask: Mask::new(Vec2::new(0.125, 0.375), Vec2::new(0.875, 1.0)),
    default_animation: AnimationId::CrabbyIdle,
    max_health: 2,
    marker: TileId::CRABBY,
};

impl EntityKind {
    /// Every kind, in marker-id order.
    pub const ALL: [EntityKind; 2] = [EntityKind::Captain, EntityKind::Crabby];

    pub fn meta(self) -> &'static KindMeta {
        match self {
            EntityKind::Captain => &CAPTAIN,
            EntityKind::Crabby => &CRABBY,
        }
    }

    /// The kind spawned by `tile`, if it is a spawn marker.
    pub fn from_marker(tile: TileId) -> Option<EntityKind> {
        Self::ALL.into_iter().find(|kind| kind.meta().marker == tile)
    }

    /// Whether this kind reads player input.
    pub fn is_player_controlled(self) -> bool {
        matches!(self, EntityKind::Captain)
    }
}
