//! The simulation world: tiles, entities, camera and input in one value.
//!
//! A [`World`] is threaded explicitly through every entry point; there is no
//! global state. It owns:
//!
//! - the [`TileStorage`] and the [`TileTable`] of tile properties,
//! - every [`Entity`] in a [`SlotMap`], iterated in creation order,
//! - the follow [`Camera`] and the current [`InputState`],
//! - the edit/run [`Mode`].
//!
//! # Frame order
//!
//! [`World::update_entities`] advances exactly one frame. For each entity,
//! in creation order: behavior produces an intent, physics integrates X then
//! Y, and the animation timer advances. The camera follows last. The walk
//! reads each successor handle before touching the current entity, so an
//! entity may be destroyed on its own turn.
//!
//! # Example
//!
//! ```
//! use corsair_engine::prelude::*;
//!
//! let mut grid = DenseGrid::new(16, 8);
//! grid.fill_rect(0, 6, 15, 7, TileId::GROUND);
//! grid.set_tile(2, 5, TileId::CAPTAIN);
//! grid.set_tile(9, 5, TileId::CRABBY);
//!
//! let mut world = World::new(grid.into(), SimConfig::default()).unwrap();
//! assert_eq!(world.start(), 2);
//! assert_eq!(world.tiles().tile_at(2, 5), TileId::BLANK);
//!
//! world.input_mut().update(ButtonSet::EMPTY.with(Button::Right));
//! world.update_entities(1.0 / 60.0);
//! assert_eq!(world.sprites().count(), 2);
//!
//! world.stop();
//! assert_eq!(world.tiles().tile_at(2, 5), TileId::CAPTAIN);
//! ```

use corsair_slots::prelude::*;
use serde::{Deserialize, Serialize};

use crate::behavior::{update_behavior, BehaviorContext, TargetView};
use crate::camera::{Camera, CameraUpdate, FollowTarget};
use crate::collision::update_physics;
use crate::config::SimConfig;
use crate::entity::{Entity, StatusFlags};
use crate::input::InputState;
use crate::kind::EntityKind;
use crate::math::Vec2;
use crate::tiles::{TileId, TileSource, TileStorage, TileTable};
use crate::EngineError;

/// Whether the level is being edited or played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Tiles are editable.
    #[default]
    Editing,
    /// Entities are live; tiles are read-only to callers.
    Running,
}

/// Render-read of one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteView {
    pub handle: Handle,
    pub position: Vec2,
    pub sprite: u16,
    pub flipped: bool,
}

/// The simulation world.
pub struct World {
    pub(crate) config: SimConfig,
    pub(crate) tiles: TileStorage,
    pub(crate) table: TileTable,
    pub(crate) entities: SlotMap<Entity>,
    pub(crate) camera: Camera,
    pub(crate) input: InputState,
    pub(crate) mode: Mode,
    /// The player-controlled entity behaviors chase.
    pub(crate) player: Option<Handle>,
    /// The entity the camera follows.
    pub(crate) follow: Option<Handle>,
}

impl World {
    /// Create a world in [`Mode::Editing`] over `tiles`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `config` fails validation.
    pub fn new(tiles: TileStorage, config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            tiles,
            table: TileTable::default(),
            entities: SlotMap::new(),
            camera: Camera::new(),
            input: InputState::new(),
            mode: Mode::Editing,
            player: None,
            follow: None,
        })
    }

    /// Replace the tile property table.
    pub fn with_tile_table(mut self, table: TileTable) -> Self {
        self.table = table;
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tiles(&self) -> &TileStorage {
        &self.tiles
    }

    pub fn tile_table(&self) -> &TileTable {
        &self.table
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Mutable input, for the windowing layer to feed once per frame.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn entity(&self, handle: Handle) -> Option<&Entity> {
        self.entities.get(handle)
    }

    /// Direct mutable access, for setup and tests.
    pub fn entity_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        self.entities.get_mut(handle)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Every live entity in creation order.
    pub fn entities(&self) -> Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn player(&self) -> Option<Handle> {
        self.player
    }

    pub fn follow_target(&self) -> Option<Handle> {
        self.follow
    }

    /// Point the camera at `target` (or at nothing).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Slots`] if `target` is stale.
    pub fn set_follow_target(&mut self, target: Option<Handle>) -> Result<(), EngineError> {
        if let Some(handle) = target {
            if !self.entities.contains(handle) {
                return Err(SlotError::StaleHandle { handle }.into());
            }
        }
        self.follow = target;
        Ok(())
    }

    // -- tiles --------------------------------------------------------------

    /// Edit a tile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TilesLocked`] while the level is running.
    /// Writes outside the grid are ignored.
    pub fn set_tile(&mut self, tx: i32, ty: i32, id: TileId) -> Result<(), EngineError> {
        if self.mode == Mode::Running {
            return Err(EngineError::TilesLocked);
        }
        self.tiles.set_tile(tx, ty, id);
        Ok(())
    }

    /// Resize the map while editing.
    pub fn resize_tiles(&mut self, width: i32, height: i32) -> Result<(), EngineError> {
        if self.mode == Mode::Running {
            return Err(EngineError::TilesLocked);
        }
        self.tiles.resize(width, height);
        Ok(())
    }

    // -- lifecycle ----------------------------------------------------------

    /// Scan the map for spawn markers (row-major), spawn one entity per
    /// marker and consume the marker tile. The first captain becomes the
    /// player and the camera target. Returns the number of entities spawned.
    ///
    /// Calling `start` on a running world does nothing.
    pub fn start(&mut self) -> usize {
        if self.mode == Mode::Running {
            tracing::warn!("start() called on a running world");
            return 0;
        }

        let mut spawned = 0;
        for ty in 0..self.tiles.height() {
            for tx in 0..self.tiles.width() {
                if let Some(kind) = EntityKind::from_marker(self.tiles.tile_at(tx, ty)) {
                    self.tiles.set_tile(tx, ty, TileId::BLANK);
                    self.create_entity(tx, ty, kind);
                    spawned += 1;
                }
            }
        }
        self.mode = Mode::Running;

        if let Some(center) = self.follow.and_then(|h| self.entities.get(h)).map(|e| e.bounds().center()) {
            let (w, h) = self.world_size();
            self.camera.center_on(center, &self.config.camera, w, h);
        }

        tracing::info!(spawned, "level started");
        spawned
    }

    /// Destroy every entity (restoring their markers) and return to editing.
    pub fn stop(&mut self) {
        let destroyed = self.clear_entities();
        self.input.clear();
        self.mode = Mode::Editing;
        tracing::info!(destroyed, "level stopped");
    }

    /// Create an entity of `kind` in tile `(tx, ty)`.
    ///
    /// The first player-controlled entity becomes the player and, if no
    /// follow target is set, the camera target.
    pub fn create_entity(&mut self, tx: i32, ty: i32, kind: EntityKind) -> Handle {
        let handle = self.entities.insert(Entity::new(kind, tx, ty));
        if kind.is_player_controlled() && self.player.is_none() {
            self.player = Some(handle);
            if self.follow.is_none() {
                self.follow = Some(handle);
            }
        }
        tracing::debug!(%handle, ?kind, tx, ty, "entity created");
        handle
    }

    /// Destroy an entity, restoring its spawn marker. Returns `false` for a
    /// stale handle.
    pub fn destroy_entity(&mut self, handle: Handle) -> bool {
        let entity = match self.entities.remove(handle) {
            Ok(entity) => entity,
            Err(_) => return false,
        };
        self.tiles
            .set_tile(entity.spawn.x, entity.spawn.y, entity.meta().marker);
        if self.follow == Some(handle) {
            self.follow = None;
        }
        if self.player == Some(handle) {
            self.player = None;
        }
        tracing::debug!(%handle, kind = ?entity.kind, "entity destroyed");
        true
    }

    /// Destroy every entity. Returns how many were destroyed; clearing an
    /// empty world is a no-op.
    pub fn clear_entities(&mut self) -> usize {
        let mut destroyed = 0;
        let mut cursor = self.entities.first();
        while let Some(handle) = cursor {
            cursor = self.entities.next(handle);
            if self.destroy_entity(handle) {
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Subtract `amount` from an entity's health (floored at zero). An
    /// entity at zero health is destroyed on its next turn in
    /// [`update_entities`](Self::update_entities). Returns the remaining
    /// health.
    pub fn damage(&mut self, handle: Handle, amount: i32) -> Result<i32, EngineError> {
        let entity = self
            .entities
            .get_mut(handle)
            .ok_or(SlotError::StaleHandle { handle })?;
        entity.health = (entity.health - amount).max(0);
        Ok(entity.health)
    }

    // -- frame --------------------------------------------------------------

    /// The delta the simulation will actually apply for a raw `dt`.
    pub fn effective_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            0.0
        } else {
            dt.min(self.config.physics.max_dt)
        }
    }

    /// Advance the simulation by exactly one frame.
    pub fn update_entities(&mut self, dt: f32) -> CameraUpdate {
        let applied = self.effective_dt(dt);
        if applied != dt {
            tracing::warn!(dt, applied, "frame delta clamped");
        }

        let mut cursor = self.entities.first();
        while let Some(handle) = cursor {
            cursor = self.entities.next(handle);
            self.update_entity(handle, applied);
        }

        self.update_camera(applied)
    }

    fn update_entity(&mut self, handle: Handle, dt: f32) {
        let Some(entity) = self.entities.get(handle) else {
            return;
        };
        if entity.health <= 0 {
            self.destroy_entity(handle);
            return;
        }

        let target = self
            .player
            .filter(|&p| p != handle)
            .and_then(|p| self.entities.get(p))
            .map(TargetView::of);
        let ctx = BehaviorContext {
            tiles: &self.tiles,
            table: &self.table,
            input: &self.input,
            config: &self.config,
            target,
        };
        let intent = update_behavior(entity, &ctx);

        let Some(entity) = self.entities.get_mut(handle) else {
            return;
        };
        entity.vel = intent.velocity;
        if intent.jump {
            entity.flags.remove(StatusFlags::GROUNDED);
        }
        entity.face_motion();
        entity.anim.change(intent.animation);

        update_physics(entity, dt, &self.config.physics, &self.tiles, &self.table);
        entity.anim.tick(dt);
    }

    fn update_camera(&mut self, dt: f32) -> CameraUpdate {
        let Some(target) = self.follow.and_then(|h| self.entities.get(h)) else {
            return CameraUpdate::default();
        };
        let follow = FollowTarget {
            center: target.bounds().center(),
            vx: target.vel.x,
        };
        let (w, h) = self.world_size();
        self.camera.update(follow, dt, &self.config.camera, w, h)
    }

    fn world_size(&self) -> (f32, f32) {
        (self.tiles.width() as f32, self.tiles.height() as f32)
    }

    // -- render-read --------------------------------------------------------

    /// `{position, sprite, flipped}` of every entity, in creation order.
    pub fn sprites(&self) -> impl Iterator<Item = SpriteView> + '_ {
        self.entities.iter().map(|(handle, e)| SpriteView {
            handle,
            position: e.pos,
            sprite: e.anim.sprite(),
            flipped: e.is_flipped(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
