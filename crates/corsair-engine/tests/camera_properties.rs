//! Property tests for the follow camera.

use corsair_engine::camera::{Camera, FollowTarget};
use corsair_engine::config::CameraConfig;
use corsair_engine::math::Vec2;
use proptest::prelude::*;

const WORLD_W: f32 = 20.0;
const WORLD_H: f32 = 12.0;

/// A wandering target: each step moves by `vx * dt` from the previous
/// center, wrapped into the world.
fn path_strategy() -> impl Strategy<Value = (f32, Vec<(f32, f32, f32)>)> {
    (
        0.0f32..WORLD_W,
        prop::collection::vec((-12.0f32..12.0, 0.0f32..WORLD_H, 0.0f32..0.1), 1..200),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1_000))]

    #[test]
    fn camera_stays_in_world_and_resets_focus_on_clamp((start, steps) in path_strategy()) {
        let cfg = CameraConfig::default();
        let max_x = WORLD_W - cfg.view_width;
        let mut cam = Camera::new();
        let mut x = start;
        cam.center_on(Vec2::new(x, WORLD_H * 0.5), &cfg, WORLD_W, WORLD_H);

        for (vx, y, dt) in steps {
            x = (x + vx * dt).clamp(0.0, WORLD_W);
            let before = cam.focus();
            let update = cam.update(
                FollowTarget { center: Vec2::new(x, y), vx },
                dt,
                &cfg,
                WORLD_W,
                WORLD_H,
            );

            prop_assert!((0.0..=max_x).contains(&cam.x), "camera x {} outside world", cam.x);
            prop_assert!((0.0..=WORLD_H - cfg.view_height).contains(&cam.y));
            prop_assert!(cam.focus().abs() <= cfg.focus_bound);

            if update.clamped {
                prop_assert_eq!(cam.focus(), 0.0);
            } else {
                let expected = (before + vx * dt).clamp(-cfg.focus_bound, cfg.focus_bound);
                prop_assert_eq!(cam.focus(), expected);

                let rel = x - cam.x;
                prop_assert!(rel >= cfg.edge_margin - 1e-3, "target {} left of band", rel);
                prop_assert!(
                    rel <= cfg.view_width - cfg.edge_margin + 1e-3,
                    "target {} right of band",
                    rel
                );
            }
        }
    }

    #[test]
    fn still_target_never_moves_focus(
        x in 0.0f32..WORLD_W,
        frames in 1usize..50,
    ) {
        let cfg = CameraConfig::default();
        let mut cam = Camera::new();
        cam.center_on(Vec2::new(x, 3.0), &cfg, WORLD_W, WORLD_H);
        let origin = cam.x;

        for _ in 0..frames {
            cam.update(
                FollowTarget { center: Vec2::new(x, 3.0), vx: 0.0 },
                1.0 / 60.0,
                &cfg,
                WORLD_W,
                WORLD_H,
            );
        }
        prop_assert_eq!(cam.focus(), 0.0);
        prop_assert_eq!(cam.x, origin);
    }
}
