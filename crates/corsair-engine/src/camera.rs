//! Follow camera with lead hysteresis.
//!
//! Horizontally the camera keeps a scalar *focus* that accumulates the
//! target's motion up to `±focus_bound`. Small back-and-forth movement only
//! moves the focus; once it saturates in the direction of travel, the camera
//! pans with the target, but only while the target is in the leading half of
//! the viewport. An edge band catches the target up whenever it gets closer
//! than `edge_margin` to either side.
//!
//! The horizontal position is clamped to the world, and a clamp that
//! actually moves the camera resets the focus. Vertically the camera simply
//! centers the target within the world.

use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::math::{Aabb, Vec2};

/// What the camera follows this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    /// Center of the target's box.
    pub center: Vec2,
    /// Target's horizontal velocity.
    pub vx: f32,
}

/// Result of one [`Camera::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraUpdate {
    /// The world clamp moved the camera (and reset the focus).
    pub clamped: bool,
}

/// Top-left corner of the viewport in tiles, plus hysteresis state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    focus: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated lead, in `[-focus_bound, focus_bound]`.
    pub fn focus(&self) -> f32 {
        self.focus
    }

    /// Snap the viewport onto `center` with no lead.
    pub fn center_on(&mut self, center: Vec2, cfg: &CameraConfig, world_w: f32, world_h: f32) {
        self.x = center.x - cfg.view_width * 0.5;
        self.y = center.y - cfg.view_height * 0.5;
        self.focus = 0.0;
        self.clamp(cfg, world_w, world_h);
    }

    /// Follow `target` for one frame of `dt` seconds.
    pub fn update(
        &mut self,
        target: FollowTarget,
        dt: f32,
        cfg: &CameraConfig,
        world_w: f32,
        world_h: f32,
    ) -> CameraUpdate {
        let vx = target.vx;
        if vx != 0.0 {
            let bound = cfg.focus_bound;
            self.focus = (self.focus + vx * dt).clamp(-bound, bound);

            let saturated = if vx > 0.0 {
                self.focus >= bound
            } else {
                self.focus <= -bound
            };
            if saturated {
                let rel = target.center.x - self.x;
                let half = cfg.view_width * 0.5;
                let leading = if vx > 0.0 { rel >= half } else { rel <= half };
                if leading {
                    self.x += vx * dt;
                }
            }
        }

        let rel = target.center.x - self.x;
        let far = cfg.view_width - cfg.edge_margin;
        if rel > far {
            self.x = target.center.x - far;
        } else if rel < cfg.edge_margin {
            self.x = target.center.x - cfg.edge_margin;
        }

        self.y = target.center.y - cfg.view_height * 0.5;

        CameraUpdate {
            clamped: self.clamp(cfg, world_w, world_h),
        }
    }

    /// Keep the viewport inside the world. Returns whether `x` moved.
    fn clamp(&mut self, cfg: &CameraConfig, world_w: f32, world_h: f32) -> bool {
        let max_x = (world_w - cfg.view_width).max(0.0);
        let max_y = (world_h - cfg.view_height).max(0.0);
        self.y = self.y.clamp(0.0, max_y);

        let x = self.x.clamp(0.0, max_x);
        if x == self.x {
            return false;
        }
        self.x = x;
        self.focus = 0.0;
        true
    }

    /// The visible world rectangle.
    pub fn view_rect(&self, cfg: &CameraConfig) -> Aabb {
        Aabb::new(
            Vec2::new(self.x, self.y),
            Vec2::new(self.x + cfg.view_width, self.y + cfg.view_height),
        )
    }
}
