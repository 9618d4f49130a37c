//! Axis-separated swept collision against the tile grid.
//!
//! [`update_physics`] integrates an entity's position one axis at a time:
//! the horizontal pass runs to completion before the vertical pass starts
//! from the post-horizontal position. Each pass:
//!
//! 1. Advances the position in sub-steps of at most [`MAX_SUBSTEP`] tiles.
//! 2. After every sub-step, collects the solid tiles overlapped by the box
//!    (cell range via `floor`/`ceil`, shrunk by [`CONTACT_EPSILON`] so that
//!    touching is not overlapping).
//! 3. Computes the [`CornerFlags`] of every solid tile and derives one
//!    candidate displacement per tile.
//! 4. Applies the displacement chosen by [`select_displacement`] and stops
//!    the axis on contact.
//!
//! The vertical pass then sets `GROUNDED` / `CEILING_HIT` and applies gravity
//! when there was no vertical contact.
//!
//! The chosen displacement does not depend on the order tiles are visited
//! in: per direction only the largest push survives, and when both
//! directions are present the one opposing the motion wins.

use std::ops::{BitOr, BitOrAssign, RangeInclusive};

use crate::config::PhysicsConfig;
use crate::entity::{Entity, StatusFlags};
use crate::math::{Aabb, Mask, Vec2};
use crate::tiles::{TileSource, TileTable};

/// Overlap smaller than this is treated as touching.
pub const CONTACT_EPSILON: f32 = 1e-4;

/// Longest distance an axis advances before overlaps are resolved.
pub const MAX_SUBSTEP: f32 = 0.5;

/// How close a box bottom must be to a tile row to rest on it.
const RESTING_TOLERANCE: f32 = 1e-3;

/// A collision axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

// ---------------------------------------------------------------------------
// CornerFlags
// ---------------------------------------------------------------------------

/// Which corners of a box lie inside a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CornerFlags(u8);

impl CornerFlags {
    pub const NONE: CornerFlags = CornerFlags(0);
    pub const TL: CornerFlags = CornerFlags(1 << 0);
    pub const TR: CornerFlags = CornerFlags(1 << 1);
    pub const BL: CornerFlags = CornerFlags(1 << 2);
    pub const BR: CornerFlags = CornerFlags(1 << 3);

    pub const LEFT: CornerFlags = CornerFlags(Self::TL.0 | Self::BL.0);
    pub const RIGHT: CornerFlags = CornerFlags(Self::TR.0 | Self::BR.0);
    pub const TOP: CornerFlags = CornerFlags(Self::TL.0 | Self::TR.0);
    pub const BOTTOM: CornerFlags = CornerFlags(Self::BL.0 | Self::BR.0);

    /// Whether any bit of `other` is set.
    pub fn intersects(self, other: CornerFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for CornerFlags {
    type Output = CornerFlags;

    fn bitor(self, rhs: CornerFlags) -> CornerFlags {
        CornerFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CornerFlags {
    fn bitor_assign(&mut self, rhs: CornerFlags) {
        self.0 |= rhs.0;
    }
}

/// The inclusive range of cells an interval `[lo, hi]` overlaps by more
/// than [`CONTACT_EPSILON`].
pub fn tile_span(lo: f32, hi: f32) -> RangeInclusive<i32> {
    let first = (lo + CONTACT_EPSILON).floor() as i32;
    let last = (hi - CONTACT_EPSILON).ceil() as i32 - 1;
    first..=last
}

/// Corner containment of `b` against tile `(tx, ty)` for a pass along
/// `axis`.
///
/// Corners are projected onto the tile's row (horizontal pass) or column
/// (vertical pass) before the test, so a box taller or wider than a tile
/// still reports the side that entered the obstacle.
pub fn corner_flags(b: &Aabb, tx: i32, ty: i32, axis: Axis) -> CornerFlags {
    match axis {
        Axis::X => {
            let cols = tile_span(b.min.x, b.max.x);
            let mut flags = CornerFlags::NONE;
            if *cols.start() == tx {
                flags |= CornerFlags::LEFT;
            }
            if *cols.end() == tx {
                flags |= CornerFlags::RIGHT;
            }
            flags
        }
        Axis::Y => {
            let rows = tile_span(b.min.y, b.max.y);
            let mut flags = CornerFlags::NONE;
            if *rows.start() == ty {
                flags |= CornerFlags::TOP;
            }
            if *rows.end() == ty {
                flags |= CornerFlags::BOTTOM;
            }
            flags
        }
    }
}

// ---------------------------------------------------------------------------
// Displacement selection
// ---------------------------------------------------------------------------

/// Pick `pos` or `neg` so that the result opposes `motion`; when stationary,
/// the shorter one.
fn against_motion(motion: f32, pos: f32, neg: f32) -> f32 {
    if motion > 0.0 {
        neg
    } else if motion < 0.0 {
        pos
    } else if pos <= -neg {
        pos
    } else {
        neg
    }
}

/// Running maximum of candidate pushes per direction.
#[derive(Debug, Clone, Copy, Default)]
struct Displacement {
    max_pos: f32,
    max_neg: f32,
}

impl Displacement {
    fn push(&mut self, candidate: f32) {
        if candidate > 0.0 {
            self.max_pos = self.max_pos.max(candidate);
        } else if candidate < 0.0 {
            self.max_neg = self.max_neg.min(candidate);
        }
    }

    fn resolve(self, motion: f32) -> f32 {
        match (self.max_pos > 0.0, self.max_neg < 0.0) {
            (false, false) => 0.0,
            (true, false) => self.max_pos,
            (false, true) => self.max_neg,
            (true, true) => against_motion(motion, self.max_pos, self.max_neg),
        }
    }
}

/// Choose one displacement from per-tile candidates.
///
/// With candidates in a single direction, the largest is taken (it clears
/// every tile pushing that way). With both directions present, the one
/// opposing `motion` wins, or the shorter one if `motion` is zero.
pub fn select_displacement(candidates: &[f32], motion: f32) -> f32 {
    let mut acc = Displacement::default();
    for &c in candidates {
        acc.push(c);
    }
    acc.resolve(motion)
}

/// The push that clears tile `(tx, ty)` along `axis`.
fn candidate(b: &Aabb, tx: i32, ty: i32, axis: Axis, flags: CornerFlags, motion: f32) -> f32 {
    let (lo, hi, cell, low_side, high_side) = match axis {
        Axis::X => (b.min.x, b.max.x, tx, CornerFlags::LEFT, CornerFlags::RIGHT),
        Axis::Y => (b.min.y, b.max.y, ty, CornerFlags::TOP, CornerFlags::BOTTOM),
    };
    let push_pos = (cell + 1) as f32 - lo;
    let push_neg = cell as f32 - hi;
    match (flags.intersects(low_side), flags.intersects(high_side)) {
        (true, false) => push_pos,
        (false, true) => push_neg,
        _ => against_motion(motion, push_pos, push_neg),
    }
}

// ---------------------------------------------------------------------------
// Axis passes
// ---------------------------------------------------------------------------

/// Contact reported by one axis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisContact {
    /// Blocked on the low side (left wall or ceiling); the box was pushed
    /// toward positive coordinates.
    pub negative: bool,
    /// Blocked on the high side (right wall or floor).
    pub positive: bool,
    /// Corner flags accumulated over every solid tile touched.
    pub flags: CornerFlags,
}

impl AxisContact {
    pub fn any(&self) -> bool {
        self.negative || self.positive
    }
}

/// Contacts from both passes of one [`update_physics`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicsReport {
    pub horizontal: AxisContact,
    pub vertical: AxisContact,
}

#[inline]
fn component(v: &mut Vec2, axis: Axis) -> &mut f32 {
    match axis {
        Axis::X => &mut v.x,
        Axis::Y => &mut v.y,
    }
}

/// Push the box at `pos` out of every solid tile it overlaps along `axis`.
fn resolve_overlaps<S: TileSource + ?Sized>(
    pos: &mut Vec2,
    mask: &Mask,
    axis: Axis,
    motion: f32,
    tiles: &S,
    table: &TileTable,
) -> AxisContact {
    let b = mask.at(*pos);
    let cols = tile_span(b.min.x, b.max.x);
    let mut acc = Displacement::default();
    let mut flags = CornerFlags::NONE;

    for ty in tile_span(b.min.y, b.max.y) {
        for tx in cols.clone() {
            if !table.is_solid(tiles.tile_at(tx, ty)) {
                continue;
            }
            let tile_flags = corner_flags(&b, tx, ty, axis);
            flags |= tile_flags;
            acc.push(candidate(&b, tx, ty, axis, tile_flags, motion));
        }
    }

    let d = acc.resolve(motion);
    *component(pos, axis) += d;
    AxisContact {
        negative: d > 0.0,
        positive: d < 0.0,
        flags,
    }
}

/// Move `pos` by `delta` along `axis`, stopping at the first solid tile.
///
/// Exposed so callers can compose passes in a different order; the
/// simulation itself always goes through [`update_physics`].
pub fn sweep_axis<S: TileSource + ?Sized>(
    pos: &mut Vec2,
    mask: &Mask,
    delta: f32,
    axis: Axis,
    tiles: &S,
    table: &TileTable,
) -> AxisContact {
    debug_assert!(delta.is_finite(), "non-finite sweep delta {delta}");
    let steps = (delta.abs() / MAX_SUBSTEP).ceil().max(1.0) as u32;
    let step = delta / steps as f32;

    let mut contact = AxisContact::default();
    for _ in 0..steps {
        *component(pos, axis) += step;
        contact = resolve_overlaps(pos, mask, axis, delta, tiles, table);
        if contact.any() {
            break;
        }
    }
    contact
}

/// Whether the bottom edge of `b` rests on a solid tile row.
fn resting_on_floor<S: TileSource + ?Sized>(b: &Aabb, tiles: &S, table: &TileTable) -> bool {
    let row = b.max.y.round();
    if (b.max.y - row).abs() > RESTING_TOLERANCE {
        return false;
    }
    let row = row as i32;
    tile_span(b.min.x, b.max.x).any(|tx| table.is_solid(tiles.tile_at(tx, row)))
}

/// Integrate one frame of motion for `entity`: horizontal pass, then
/// vertical pass, then contact flags and gravity.
///
/// Horizontal velocity is left untouched by wall contacts; behaviors decide
/// it fresh every frame.
pub fn update_physics<S: TileSource + ?Sized>(
    entity: &mut Entity,
    dt: f32,
    physics: &PhysicsConfig,
    tiles: &S,
    table: &TileTable,
) -> PhysicsReport {
    let mask = entity.meta().mask;

    let horizontal = sweep_axis(&mut entity.pos, &mask, entity.vel.x * dt, Axis::X, tiles, table);
    let mut vertical = sweep_axis(&mut entity.pos, &mask, entity.vel.y * dt, Axis::Y, tiles, table);

    if !vertical.any() && entity.vel.y >= 0.0 && resting_on_floor(&entity.bounds(), tiles, table) {
        vertical.positive = true;
    }

    entity
        .flags
        .remove(StatusFlags::GROUNDED | StatusFlags::CEILING_HIT);
    if vertical.positive {
        entity.vel.y = 0.0;
        entity.flags.insert(StatusFlags::GROUNDED);
    } else if vertical.negative {
        if entity.vel.y < 0.0 {
            entity.vel.y = 0.0;
            entity.flags.insert(StatusFlags::CEILING_HIT);
        }
    } else {
        entity.vel.y = (entity.vel.y + physics.gravity * dt).min(physics.max_fall_speed);
    }

    debug_assert!(entity.pos.is_finite(), "entity position became non-finite");
    PhysicsReport {
        horizontal,
        vertical,
    }
}

/// Whether `entity` may start a jump this frame: it was grounded by the
/// last vertical pass and the row of cells right above its box is clear.
pub fn can_jump<S: TileSource + ?Sized>(entity: &Entity, tiles: &S, table: &TileTable) -> bool {
    if !entity.is_grounded() {
        return false;
    }
    let b = entity.bounds();
    let above = (b.min.y + CONTACT_EPSILON).floor() as i32 - 1;
    !tile_span(b.min.x, b.max.x).any(|tx| table.is_solid(tiles.tile_at(tx, above)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::EntityKind;
    use crate::tiles::{DenseGrid, TileId};

    const EPS: f32 = 1e-4;

    /// 12x8 room: solid border, floor on row 6.
    fn room() -> DenseGrid {
        DenseGrid::from_fn(12, 8, |tx, ty| {
            if tx == 0 || tx == 11 || ty == 0 || ty >= 6 {
                TileId::GROUND
            } else {
                TileId::BLANK
            }
        })
    }

    #[test]
    fn span_excludes_touching_cells() {
        assert_eq!(tile_span(2.0, 3.0), 2..=2);
        assert_eq!(tile_span(2.5, 3.5), 2..=3);
        assert_eq!(tile_span(-0.5, 0.25), -1..=0);
    }

    #[test]
    fn corner_flags_report_entering_side() {
        let b = Aabb::new(Vec2::new(4.5, 2.25), Vec2::new(5.25, 3.0));
        assert_eq!(corner_flags(&b, 5, 2, Axis::X), CornerFlags::RIGHT);
        assert_eq!(corner_flags(&b, 4, 2, Axis::X), CornerFlags::LEFT);
        // Narrow box inside one row: both top and bottom.
        assert_eq!(
            corner_flags(&b, 4, 2, Axis::Y),
            CornerFlags::TOP | CornerFlags::BOTTOM
        );
    }

    #[test]
    fn selection_prefers_largest_single_direction() {
        assert_eq!(select_displacement(&[0.25, 0.5, 0.1], 0.0), 0.5);
        assert_eq!(select_displacement(&[-0.25, -0.5], 1.0), -0.5);
        assert_eq!(select_displacement(&[], 1.0), 0.0);
    }

    #[test]
    fn selection_with_both_directions_opposes_motion() {
        assert_eq!(select_displacement(&[0.25, -0.5], 1.0), -0.5);
        assert_eq!(select_displacement(&[0.25, -0.5], -1.0), 0.25);
        assert_eq!(select_displacement(&[0.25, -0.5], 0.0), 0.25);
    }

    #[test]
    fn falling_entity_lands_and_is_grounded() {
        let grid = room();
        let table = TileTable::default();
        let physics = PhysicsConfig::default();
        let mut e = Entity::new(EntityKind::Captain, 3, 3);
        e.vel.y = 5.0;

        for _ in 0..40 {
            update_physics(&mut e, 0.05, &physics, &grid, &table);
        }
        assert!(e.is_grounded());
        assert_eq!(e.vel.y, 0.0);
        assert!((e.bounds().max.y - 6.0).abs() < EPS);
    }

    #[test]
    fn grounded_is_stable_on_flat_floor() {
        let grid = room();
        let table = TileTable::default();
        let physics = PhysicsConfig::default();
        let mut e = Entity::new(EntityKind::Captain, 3, 5);
        for _ in 0..100 {
            update_physics(&mut e, 1.0 / 60.0, &physics, &grid, &table);
            assert!(e.is_grounded());
            assert_eq!(e.pos.y, 5.0);
        }
    }

    #[test]
    fn rising_into_ceiling_sets_ceiling_hit() {
        let grid = room();
        let table = TileTable::default();
        let physics = PhysicsConfig::default();
        let mut e = Entity::new(EntityKind::Captain, 3, 1);
        e.vel.y = -9.0;

        let report = update_physics(&mut e, 0.1, &physics, &grid, &table);
        assert!(report.vertical.negative);
        assert!(e.flags.contains(StatusFlags::CEILING_HIT));
        assert!(!e.is_grounded());
        assert_eq!(e.vel.y, 0.0);
        assert!((e.bounds().min.y - 1.0).abs() < EPS);
    }

    #[test]
    fn gravity_is_capped_at_terminal_velocity() {
        let grid = DenseGrid::new(4, 200);
        let table = TileTable::default();
        let physics = PhysicsConfig::default();
        let mut e = Entity::new(EntityKind::Crabby, 1, 0);
        for _ in 0..30 {
            update_physics(&mut e, 0.1, &physics, &grid, &table);
        }
        assert_eq!(e.vel.y, physics.max_fall_speed);
    }

    #[test]
    fn wall_contact_keeps_horizontal_velocity() {
        let grid = room();
        let table = TileTable::default();
        let physics = PhysicsConfig::default();
        let mut e = Entity::new(EntityKind::Captain, 10, 5);
        e.vel.x = 5.0;

        let report = update_physics(&mut e, 0.1, &physics, &grid, &table);
        assert!(report.horizontal.positive);
        assert!(report.horizontal.flags.intersects(CornerFlags::RIGHT));
        assert_eq!(e.vel.x, 5.0);
        assert!((e.bounds().max.x - 11.0).abs() < EPS);
    }

    #[test]
    fn large_step_does_not_tunnel() {
        let mut grid = DenseGrid::new(20, 4);
        grid.fill_rect(0, 3, 19, 3, TileId::GROUND);
        grid.set_tile(6, 2, TileId::SOLID);
        let table = TileTable::default();
        let mut pos = Vec2::new(1.0, 2.0);
        let mask = EntityKind::Captain.meta().mask;

        let contact = sweep_axis(&mut pos, &mask, 12.0, Axis::X, &grid, &table);
        assert!(contact.positive);
        assert!((pos.x + mask.br.x - 6.0).abs() < EPS);
    }

    #[test]
    fn jump_gate_requires_ground_and_headroom() {
        let mut grid = room();
        let table = TileTable::default();
        let mut e = Entity::new(EntityKind::Captain, 3, 5);
        assert!(!can_jump(&e, &grid, &table));

        e.flags.insert(StatusFlags::GROUNDED);
        assert!(can_jump(&e, &grid, &table));

        grid.set_tile(3, 4, TileId::SOLID);
        assert!(!can_jump(&e, &grid, &table));
    }
}
