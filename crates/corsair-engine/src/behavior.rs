//! Per-kind behavior: what an entity wants to do this frame.
//!
//! [`update_behavior`] dispatches on [`EntityKind`] and returns an
//! [`Intent`] (desired velocity, whether a jump starts, which animation to
//! play). The world applies the intent before physics runs, which keeps
//! collision and animation kind-agnostic.

use crate::animation::AnimationId;
use crate::collision::{can_jump, CONTACT_EPSILON};
use crate::config::SimConfig;
use crate::entity::Entity;
use crate::input::{Button, InputState};
use crate::kind::EntityKind;
use crate::math::Vec2;
use crate::tiles::{TileSource, TileTable};

/// How far past its leading edge a patrolling entity probes for walls and
/// ledges.
const PROBE_DISTANCE: f32 = 0.05;

/// What an entity wants to do this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    /// Velocity to integrate this frame.
    pub velocity: Vec2,
    /// A jump starts this frame; the world clears `GROUNDED`.
    pub jump: bool,
    pub animation: AnimationId,
}

/// Where the player-controlled entity is, as seen by AI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Horizontal center of the target's box.
    pub center_x: f32,
    /// Bottom edge (feet) of the target's box.
    pub bottom: f32,
    /// Width of the target's mask.
    pub width: f32,
}

impl TargetView {
    pub fn of(entity: &Entity) -> Self {
        let b = entity.bounds();
        Self {
            center_x: b.center().x,
            bottom: b.max.y,
            width: b.width(),
        }
    }
}

/// Everything a behavior may read besides its own entity.
pub struct BehaviorContext<'a, S: TileSource + ?Sized> {
    pub tiles: &'a S,
    pub table: &'a TileTable,
    pub input: &'a InputState,
    pub config: &'a SimConfig,
    /// The player-controlled entity, unless it is the one being updated.
    pub target: Option<TargetView>,
}

/// Decide this frame's intent for `entity`.
pub fn update_behavior<S: TileSource + ?Sized>(entity: &Entity, ctx: &BehaviorContext<'_, S>) -> Intent {
    match entity.kind {
        EntityKind::Captain => captain(entity, ctx),
        EntityKind::Crabby => crabby(entity, ctx),
    }
}

fn captain<S: TileSource + ?Sized>(entity: &Entity, ctx: &BehaviorContext<'_, S>) -> Intent {
    let cfg = &ctx.config.player;

    let mut vx = 0.0;
    if ctx.input.held(Button::Left) {
        vx -= cfg.run_speed;
    }
    if ctx.input.held(Button::Right) {
        vx += cfg.run_speed;
    }

    let mut vy = entity.vel.y;
    let jump = ctx.input.just_pressed(Button::Jump) && can_jump(entity, ctx.tiles, ctx.table);
    if jump {
        vy = -cfg.jump_speed;
    }

    let animation = if vy < 0.0 {
        AnimationId::CaptainJump
    } else if vy > cfg.fall_threshold {
        AnimationId::CaptainFall
    } else if vx != 0.0 {
        AnimationId::CaptainRun
    } else {
        AnimationId::CaptainIdle
    };

    Intent {
        velocity: Vec2::new(vx, vy),
        jump,
        animation,
    }
}

fn crabby<S: TileSource + ?Sized>(entity: &Entity, ctx: &BehaviorContext<'_, S>) -> Intent {
    let vx = seek(entity, ctx).unwrap_or_else(|| patrol(entity, ctx));
    let animation = if vx != 0.0 {
        AnimationId::CrabbyRun
    } else {
        AnimationId::CrabbyIdle
    };
    Intent {
        velocity: Vec2::new(vx, entity.vel.y),
        jump: false,
        animation,
    }
}

/// Horizontal speed toward the target if it is in sight, `None` otherwise.
fn seek<S: TileSource + ?Sized>(entity: &Entity, ctx: &BehaviorContext<'_, S>) -> Option<f32> {
    let cfg = &ctx.config.enemy;
    let target = ctx.target?;
    let me = entity.bounds();

    if (target.bottom - me.max.y).abs() > cfg.row_tolerance {
        return None;
    }
    let dx = target.center_x - me.center().x;
    if dx.abs() > cfg.seek_widths * target.width {
        return None;
    }

    let dead_zone = (me.width() + target.width) * 0.5;
    if dx.abs() <= dead_zone {
        Some(0.0)
    } else {
        Some(dx.signum() * cfg.charge_speed)
    }
}

/// Walk in the facing direction, turning at walls and (when grounded) at
/// ledges.
fn patrol<S: TileSource + ?Sized>(entity: &Entity, ctx: &BehaviorContext<'_, S>) -> f32 {
    let b = entity.bounds();
    let dir = if entity.is_flipped() { -1.0 } else { 1.0 };
    let probe_x = if dir > 0.0 {
        b.max.x + PROBE_DISTANCE
    } else {
        b.min.x - PROBE_DISTANCE
    };
    let solid = |x: f32, y: f32| ctx.table.is_solid(ctx.tiles.get_tile(x, y));

    let wall_ahead = solid(probe_x, b.max.y - CONTACT_EPSILON * 10.0);
    let floor_ahead = solid(probe_x, b.max.y + 0.5);
    let turn = wall_ahead || (entity.is_grounded() && !floor_ahead);

    let dir = if turn { -dir } else { dir };
    dir * ctx.config.enemy.patrol_speed
}
