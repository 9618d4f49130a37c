//! Variable-timestep frame driver.
//!
//! The [`FrameLoop`] owns a [`World`] and drives it one frame at a time.
//! Each frame:
//!
//! 1. The held-button snapshot set with [`FrameLoop::set_input`] is folded
//!    into the world's press counts.
//! 2. The raw frame delta is clamped to `physics.max_dt`.
//! 3. The world runs exactly one [`update_entities`](World::update_entities)
//!    pass.
//! 4. The frame counter advances and diagnostics are recorded.
//!
//! Given the same initial world and the same sequence of `(dt, buttons)`
//! pairs, the resulting state is identical, which is what
//! [`replay`](crate::replay) relies on.
//!
//! # Example
//!
//! ```
//! use corsair_engine::prelude::*;
//!
//! let mut grid = DenseGrid::new(12, 6);
//! grid.fill_rect(0, 5, 11, 5, TileId::GRASS);
//! grid.set_tile(1, 4, TileId::CAPTAIN);
//!
//! let mut world = World::new(grid.into(), SimConfig::default()).unwrap();
//! world.start();
//!
//! let mut frames = FrameLoop::new(world);
//! frames.set_input(ButtonSet::EMPTY.with(Button::Right));
//! frames.run_frames(30, 1.0 / 60.0);
//!
//! assert_eq!(frames.frame_count(), 30);
//! let player = frames.world().player().unwrap();
//! assert!(frames.world().entity(player).unwrap().pos.x > 1.0);
//! ```

use std::time::{Duration, Instant};

use crate::input::ButtonSet;
use crate::world::World;

/// Timing diagnostics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Wall-clock time spent in the frame.
    pub frame_time: Duration,
    /// Delta the simulation actually applied.
    pub applied_dt: f32,
    /// Whether the raw delta was clamped.
    pub clamped: bool,
    /// Whether the camera hit the world bounds.
    pub camera_clamped: bool,
}

/// Drives a [`World`] frame by frame.
pub struct FrameLoop {
    world: World,
    /// Number of frames executed so far.
    frame_counter: u64,
    /// Buttons held for the next frame.
    current_input: ButtonSet,
    last_diagnostics: FrameDiagnostics,
}

impl FrameLoop {
    pub fn new(world: World) -> Self {
        Self {
            world,
            frame_counter: 0,
            current_input: ButtonSet::EMPTY,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Run one frame with a raw delta of `raw_dt` seconds.
    pub fn frame(&mut self, raw_dt: f32) -> &FrameDiagnostics {
        let start = Instant::now();

        self.world.input_mut().update(self.current_input);
        let applied_dt = self.world.effective_dt(raw_dt);
        let camera = self.world.update_entities(raw_dt);
        self.frame_counter += 1;

        self.last_diagnostics = FrameDiagnostics {
            frame_time: start.elapsed(),
            applied_dt,
            clamped: applied_dt != raw_dt,
            camera_clamped: camera.clamped,
        };
        tracing::trace!(
            frame = self.frame_counter,
            dt = applied_dt,
            entities = self.world.entity_count(),
            "frame complete"
        );
        &self.last_diagnostics
    }

    /// Run `count` frames with the same delta and held buttons.
    pub fn run_frames(&mut self, count: u64, dt: f32) {
        for _ in 0..count {
            self.frame(dt);
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    pub(crate) fn set_frame_count(&mut self, frames: u64) {
        self.frame_counter = frames;
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Set the buttons held during the next frame(s).
    pub fn set_input(&mut self, buttons: ButtonSet) {
        self.current_input = buttons;
    }

    pub fn current_input(&self) -> ButtonSet {
        self.current_input
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    /// Consume the loop, returning the world.
    pub fn into_world(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::input::Button;
    use crate::kind::EntityKind;
    use crate::tiles::{DenseGrid, TileId};

    fn frame_loop() -> FrameLoop {
        let mut grid = DenseGrid::new(20, 8);
        grid.fill_rect(0, 6, 19, 7, TileId::GROUND);
        let mut world = World::new(grid.into(), SimConfig::default()).unwrap();
        world.create_entity(3, 5, EntityKind::Captain);
        FrameLoop::new(world)
    }

    #[test]
    fn frames_are_counted() {
        let mut fl = frame_loop();
        fl.run_frames(12, 1.0 / 60.0);
        assert_eq!(fl.frame_count(), 12);
    }

    #[test]
    fn diagnostics_report_clamped_delta() {
        let mut fl = frame_loop();
        let diag = fl.frame(0.25).clone();
        assert!(diag.clamped);
        assert_eq!(diag.applied_dt, 0.1);

        let diag = fl.frame(0.02).clone();
        assert!(!diag.clamped);
        assert_eq!(diag.applied_dt, 0.02);
    }

    #[test]
    fn input_is_applied_each_frame() {
        let mut fl = frame_loop();
        let jump = ButtonSet::EMPTY.with(Button::Jump);
        fl.set_input(jump);
        fl.frame(1.0 / 60.0);
        assert!(fl.world().input().just_pressed(Button::Jump));
        fl.frame(1.0 / 60.0);
        assert_eq!(fl.world().input().press_count(Button::Jump), 2);
        fl.set_input(ButtonSet::EMPTY);
        fl.frame(1.0 / 60.0);
        assert!(!fl.world().input().held(Button::Jump));
    }
}
