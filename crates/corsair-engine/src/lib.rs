//! Corsair Engine -- per-frame simulation core of a 2D tile platformer.
//!
//! The crate advances entity state against a static tile grid: behaviors set
//! velocities, the collision resolver integrates position one axis at a time
//! and keeps boxes out of solid tiles, animations advance their frame timers
//! and a hysteresis camera follows the player. Windowing, rendering and
//! audio are collaborators: they feed a frame delta and a button snapshot in
//! and read `{position, sprite, flipped}` back out through
//! [`World::sprites`](world::World::sprites).
//!
//! # Quick Start
//!
//! ```
//! use corsair_engine::prelude::*;
//!
//! let mut grid = DenseGrid::new(20, 8);
//! grid.fill_rect(0, 6, 19, 7, TileId::GROUND);
//! grid.set_tile(2, 5, TileId::CAPTAIN);
//! grid.set_tile(14, 5, TileId::CRABBY);
//!
//! let mut world = World::new(grid.into(), SimConfig::default()).unwrap();
//! world.start();
//!
//! let mut frames = FrameLoop::new(world);
//! frames.set_input(ButtonSet::EMPTY.with(Button::Right));
//! frames.run_frames(60, 1.0 / 60.0);
//!
//! for sprite in frames.world().sprites() {
//!     assert!(sprite.position.is_finite());
//! }
//! ```

#![deny(unsafe_code)]

pub mod animation;
pub mod behavior;
pub mod camera;
pub mod collision;
pub mod config;
pub mod entity;
pub mod frame;
pub mod input;
pub mod kind;
pub mod math;
pub mod replay;
pub mod snapshot;
pub mod tiles;
pub mod world;

/// Re-export the slot storage crate for convenience.
pub use corsair_slots;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world and configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Tiles cannot be edited while the level is running.
    #[error("tiles are locked while the level is running")]
    TilesLocked,

    /// A configuration value failed validation.
    #[error("invalid config value `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A configuration document could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A handle did not resolve.
    #[error(transparent)]
    Slots(#[from] corsair_slots::SlotError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use corsair_slots::prelude::*;

    pub use crate::animation::{AnimationId, AnimationState};
    pub use crate::camera::{Camera, CameraUpdate};
    pub use crate::collision::{can_jump, update_physics, PhysicsReport};
    pub use crate::config::{CameraConfig, EnemyConfig, PhysicsConfig, PlayerConfig, SimConfig};
    pub use crate::entity::{Entity, StatusFlags, TileCoord};
    pub use crate::frame::{FrameDiagnostics, FrameLoop};
    pub use crate::input::{Button, ButtonSet, InputState};
    pub use crate::kind::EntityKind;
    pub use crate::math::{Aabb, Mask, Vec2};
    pub use crate::replay::{
        replay, Checkpoint, FrameRecord, ReplayDivergence, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::snapshot::{FrameSnapshot, WorldSnapshot};
    pub use crate::tiles::{
        Bounds, ChunkedGrid, DenseGrid, TileId, TileSource, TileStorage, TileTable,
    };
    pub use crate::world::{Mode, SpriteView, World};
    pub use crate::EngineError;
}
