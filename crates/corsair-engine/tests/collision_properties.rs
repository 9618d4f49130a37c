//! Property tests for the collision resolver.
//!
//! Random closed maps with random obstacles are swept by random boxes with
//! random velocities; a box that starts clear must never end a pass
//! overlapping a solid tile by more than the contact tolerance.

use corsair_engine::collision::{select_displacement, sweep_axis, tile_span, Axis};
use corsair_engine::prelude::*;
use proptest::prelude::*;

const MAP_W: i32 = 12;
const MAP_H: i32 = 10;
/// Allowed residual overlap: twice the contact epsilon plus rounding.
const TOLERANCE: f32 = 2e-4;

/// A map with a solid border and the given interior cells solid.
fn build_map(interior: &[bool]) -> DenseGrid {
    let inner_w = (MAP_W - 2) as usize;
    DenseGrid::from_fn(MAP_W, MAP_H, |tx, ty| {
        let border = tx == 0 || ty == 0 || tx == MAP_W - 1 || ty == MAP_H - 1;
        if border || interior[(ty - 1) as usize * inner_w + (tx - 1) as usize] {
            TileId::SOLID
        } else {
            TileId::BLANK
        }
    })
}

/// Blank every cell the box overlaps so the spawn position is clear.
fn carve(grid: &mut DenseGrid, b: &Aabb) {
    for ty in tile_span(b.min.y, b.max.y) {
        for tx in tile_span(b.min.x, b.max.x) {
            grid.set_tile(tx, ty, TileId::BLANK);
        }
    }
}

/// Deepest overlap of `b` with any solid tile, as `min(overlap_x, overlap_y)`.
fn penetration<S: TileSource>(b: &Aabb, tiles: &S, table: &TileTable) -> f32 {
    let mut deepest = 0.0f32;
    for ty in b.min.y.floor() as i32..=b.max.y.floor() as i32 {
        for tx in b.min.x.floor() as i32..=b.max.x.floor() as i32 {
            if !table.is_solid(tiles.tile_at(tx, ty)) {
                continue;
            }
            let ox = b.max.x.min((tx + 1) as f32) - b.min.x.max(tx as f32);
            let oy = b.max.y.min((ty + 1) as f32) - b.min.y.max(ty as f32);
            deepest = deepest.max(ox.min(oy));
        }
    }
    deepest
}

fn interior_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(
        prop::bool::weighted(0.2),
        ((MAP_W - 2) * (MAP_H - 2)) as usize,
    )
}

fn mask_strategy() -> impl Strategy<Value = Mask> {
    (0.0f32..0.5, 0.0f32..0.5, 0.2f32..1.9, 0.2f32..1.9)
        .prop_map(|(x, y, w, h)| Mask::new(Vec2::new(x, y), Vec2::new(x + w, y + h)))
}

fn motion_strategy() -> impl Strategy<Value = Vec<(f32, f32, f32)>> {
    prop::collection::vec((-40.0f32..40.0, -40.0f32..40.0, 0.0f32..0.1), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn swept_boxes_stay_out_of_solid_tiles(
        interior in interior_strategy(),
        mask in mask_strategy(),
        tx in 1..=8i32,
        ty in 1..=6i32,
        motion in motion_strategy(),
    ) {
        let mut grid = build_map(&interior);
        let mut pos = Vec2::new(tx as f32, ty as f32);
        carve(&mut grid, &mask.at(pos));
        let table = TileTable::default();
        prop_assume!(penetration(&mask.at(pos), &grid, &table) <= TOLERANCE);

        for (vx, vy, dt) in motion {
            sweep_axis(&mut pos, &mask, vx * dt, Axis::X, &grid, &table);
            let depth = penetration(&mask.at(pos), &grid, &table);
            prop_assert!(depth <= TOLERANCE, "x pass left overlap {} at {:?}", depth, pos);

            sweep_axis(&mut pos, &mask, vy * dt, Axis::Y, &grid, &table);
            let depth = penetration(&mask.at(pos), &grid, &table);
            prop_assert!(depth <= TOLERANCE, "y pass left overlap {} at {:?}", depth, pos);
        }
    }

    #[test]
    fn entities_stay_out_of_solid_tiles(
        interior in interior_strategy(),
        crabby in any::<bool>(),
        tx in 1..=9i32,
        ty in 1..=7i32,
        motion in motion_strategy(),
    ) {
        let kind = if crabby { EntityKind::Crabby } else { EntityKind::Captain };
        let mut grid = build_map(&interior);
        let mut entity = Entity::new(kind, tx, ty);
        carve(&mut grid, &entity.bounds());
        let table = TileTable::default();
        let physics = PhysicsConfig::default();

        for (vx, vy, dt) in motion {
            entity.vel = Vec2::new(vx, vy);
            let report = update_physics(&mut entity, dt, &physics, &grid, &table);
            let depth = penetration(&entity.bounds(), &grid, &table);
            prop_assert!(depth <= TOLERANCE, "overlap {} at {:?}", depth, entity.pos);
            prop_assert!(entity.vel.y <= physics.max_fall_speed);
            prop_assert_eq!(entity.is_grounded(), report.vertical.positive);
        }
    }

    #[test]
    fn displacement_ignores_candidate_order(
        (candidates, shuffled) in prop::collection::vec(-3.0f32..3.0, 0..12)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        motion in -1.0f32..1.0,
    ) {
        prop_assert_eq!(
            select_displacement(&candidates, motion),
            select_displacement(&shuffled, motion)
        );
    }

    #[test]
    fn displacement_opposes_motion_when_both_directions_present(
        pos in 0.01f32..3.0,
        neg in -3.0f32..-0.01,
        motion in prop_oneof![-2.0f32..-0.01, 0.01f32..2.0],
    ) {
        let d = select_displacement(&[pos, neg], motion);
        prop_assert!(d * motion < 0.0);
    }
}
