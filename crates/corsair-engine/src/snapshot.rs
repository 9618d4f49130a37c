//! Frame-level snapshot and restore with BLAKE3 hashing.
//!
//! Provides [`FrameSnapshot`] -- a serializable representation of the full
//! simulation state (tiles, entities, camera, input, mode, frame counter)
//! with a BLAKE3 digest used both to detect corrupted snapshots and to
//! compare runs frame by frame.
//!
//! # Usage
//!
//! ```
//! use corsair_engine::prelude::*;
//!
//! let mut grid = DenseGrid::new(12, 6);
//! grid.fill_rect(0, 5, 11, 5, TileId::GRASS);
//! grid.set_tile(2, 4, TileId::CAPTAIN);
//! let mut world = World::new(grid.into(), SimConfig::default()).unwrap();
//! world.start();
//!
//! let mut frames = FrameLoop::new(world);
//! frames.run_frames(10, 1.0 / 60.0);
//!
//! let snapshot = frames.capture_snapshot();
//! assert_eq!(snapshot.frame_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! frames.set_input(ButtonSet::EMPTY.with(Button::Right));
//! frames.run_frames(10, 1.0 / 60.0);
//!
//! frames.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(frames.frame_count(), 10);
//! assert_eq!(frames.state_hash(), snapshot.hash);
//! ```
//!
//! # Not captured
//!
//! - **Tile table** -- properties are static per game; the restored world
//!   keeps the table it already has.
//! - **Diagnostics** -- per-frame timing is transient.

use corsair_slots::prelude::*;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::config::SimConfig;
use crate::entity::Entity;
use crate::frame::FrameLoop;
use crate::input::{ButtonSet, InputState};
use crate::tiles::TileStorage;
use crate::world::{Mode, World};

// ---------------------------------------------------------------------------
// WorldSnapshot
// ---------------------------------------------------------------------------

/// Serializable state of a [`World`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub config: SimConfig,
    pub tiles: TileStorage,
    pub entities: SlotMap<Entity>,
    pub camera: Camera,
    pub input: InputState,
    pub mode: Mode,
    pub player: Option<Handle>,
    pub follow: Option<Handle>,
}

impl World {
    /// Capture the serializable state of this world.
    pub fn capture_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            config: self.config.clone(),
            tiles: self.tiles.clone(),
            entities: self.entities.clone(),
            camera: self.camera.clone(),
            input: self.input.clone(),
            mode: self.mode,
            player: self.player,
            follow: self.follow,
        }
    }

    /// Replace this world's state with `snapshot`.
    ///
    /// # Errors
    ///
    /// Fails without modifying the world if the config is invalid, the entity
    /// links are corrupt, or the player/follow handles do not resolve.
    pub fn restore_from_snapshot(&mut self, snapshot: &WorldSnapshot) -> anyhow::Result<()> {
        snapshot
            .config
            .validate()
            .map_err(|e| anyhow::anyhow!("snapshot config is invalid: {e}"))?;
        snapshot
            .entities
            .check_links()
            .map_err(|e| anyhow::anyhow!("snapshot entity order is corrupt: {e}"))?;
        for (role, handle) in [("player", snapshot.player), ("follow target", snapshot.follow)] {
            if let Some(handle) = handle {
                if !snapshot.entities.contains(handle) {
                    return Err(anyhow::anyhow!(
                        "snapshot {role} {handle} does not refer to a live entity"
                    ));
                }
            }
        }
        if let Some((handle, _)) = snapshot.entities.iter().find(|(_, e)| !e.pos.is_finite()) {
            return Err(anyhow::anyhow!(
                "snapshot entity {handle} has a non-finite position"
            ));
        }

        self.config = snapshot.config.clone();
        self.tiles = snapshot.tiles.clone();
        self.entities = snapshot.entities.clone();
        self.camera = snapshot.camera.clone();
        self.input = snapshot.input.clone();
        self.mode = snapshot.mode;
        self.player = snapshot.player;
        self.follow = snapshot.follow;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FrameSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of the full frame-loop state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub world: WorldSnapshot,
    /// Number of frames executed at the time of capture.
    pub frame_counter: u64,
    /// Buttons held for the next frame at the time of capture.
    pub current_input: ButtonSet,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the serialized state.
    pub hash: String,
}

/// Compute the BLAKE3 hex digest of the hashable state.
fn compute_hash(
    world: &WorldSnapshot,
    frame_counter: u64,
    current_input: ButtonSet,
) -> anyhow::Result<String> {
    #[derive(Serialize)]
    struct HashableState<'a> {
        world: &'a WorldSnapshot,
        frame_counter: u64,
        current_input: ButtonSet,
    }

    let bytes = serde_json::to_vec(&HashableState {
        world,
        frame_counter,
        current_input,
    })?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Hash of a state that was just captured from a live world.
///
/// Encoding a live world does not fail in practice; if it ever does, the
/// failure is logged and the empty hash never matches a recorded one.
fn live_hash(world: &WorldSnapshot, frame_counter: u64, current_input: ButtonSet) -> String {
    compute_hash(world, frame_counter, current_input).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to encode state for hashing");
        String::new()
    })
}

impl FrameLoop {
    /// Capture a complete snapshot of the simulation state.
    pub fn capture_snapshot(&self) -> FrameSnapshot {
        let world = self.world().capture_snapshot();
        let frame_counter = self.frame_count();
        let current_input = self.current_input();
        let hash = live_hash(&world, frame_counter, current_input);
        FrameSnapshot {
            world,
            frame_counter,
            current_input,
            hash,
        }
    }

    /// Restore the simulation from a previously captured snapshot.
    ///
    /// The hash is recomputed and compared first; on any error the loop is
    /// left unmodified.
    pub fn restore_from_snapshot(&mut self, snapshot: &FrameSnapshot) -> anyhow::Result<()> {
        let expected = compute_hash(&snapshot.world, snapshot.frame_counter, snapshot.current_input)?;
        if expected != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot digest {} does not match its contents (recomputed {})",
                snapshot.hash,
                expected
            ));
        }

        self.world_mut()
            .restore_from_snapshot(&snapshot.world)
            .map_err(|e| anyhow::anyhow!("snapshot rejected: {e}"))?;
        self.set_frame_count(snapshot.frame_counter);
        self.set_input(snapshot.current_input);
        Ok(())
    }

    /// The BLAKE3 state hash, equivalent to `capture_snapshot().hash`.
    pub fn state_hash(&self) -> String {
        live_hash(&self.world().capture_snapshot(), self.frame_count(), self.current_input())
    }
}
