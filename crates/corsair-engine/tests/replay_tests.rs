//! Replay integration tests.
//!
//! A scripted run over a small level is recorded with uneven frame deltas,
//! then replayed: unchanged, with altered input, with tampered checkpoints
//! and after a JSON round trip.

use corsair_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 24x8 level: ground on rows 6..=7, a step at column 12, one captain and
/// two crabs.
fn level_grid() -> DenseGrid {
    let mut grid = DenseGrid::new(24, 8);
    grid.fill_rect(0, 6, 23, 7, TileId::GROUND);
    grid.fill_rect(12, 5, 13, 5, TileId::SOLID);
    grid.set_tile(2, 5, TileId::CAPTAIN);
    grid.set_tile(8, 5, TileId::CRABBY);
    grid.set_tile(18, 5, TileId::CRABBY);
    grid
}

fn running(tiles: TileStorage) -> FrameLoop {
    let mut world = World::new(tiles, SimConfig::default()).unwrap();
    world.start();
    FrameLoop::new(world)
}

/// Scripted input for frame `i`: run right, hop over the step, idle.
fn script(i: u64) -> (ButtonSet, f32) {
    let buttons = match i {
        0..=39 => ButtonSet::EMPTY.with(Button::Right),
        40..=44 => ButtonSet::EMPTY.with(Button::Right).with(Button::Jump),
        45..=89 => ButtonSet::EMPTY.with(Button::Right),
        _ => ButtonSet::EMPTY,
    };
    // Uneven deltas, including one above max_dt.
    let dt = match i % 4 {
        0 => 1.0 / 60.0,
        1 => 1.0 / 30.0,
        2 => 1.0 / 144.0,
        _ if i == 63 => 0.25,
        _ => 1.0 / 50.0,
    };
    (buttons, dt)
}

/// Record `frames` scripted frames with a checkpoint every `interval`.
fn record(fl: &mut FrameLoop, frames: u64, interval: u64) -> ReplayLog {
    let mut recorder = ReplayRecorder::new(fl.capture_snapshot(), interval);
    for i in 0..frames {
        let (buttons, dt) = script(i);
        fl.set_input(buttons);
        recorder.record_frame(fl.frame_count(), buttons, dt, Some(fl.state_hash()));
        fl.frame(dt);
    }
    recorder.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn replay_reproduces_recorded_run() {
    let mut fl = running(level_grid().into());
    let log = record(&mut fl, 120, 10);
    let final_hash = fl.state_hash();
    assert_eq!(log.frames.len(), 120);
    assert_eq!(log.checkpoints.len(), 12);

    let mut other = running(DenseGrid::new(4, 4).into());
    let result = replay(&mut other, &log).unwrap();
    assert!(result.completed);
    assert_eq!(result.frames_replayed, 120);
    assert!(result.first_divergence.is_none());
    assert_eq!(other.state_hash(), final_hash);
}

#[test]
fn altered_input_is_detected_at_next_checkpoint() {
    let mut fl = running(level_grid().into());
    let mut log = record(&mut fl, 60, 10);

    // Jump on frame 15 instead of standing on the ground.
    log.frames[15].buttons = ButtonSet::EMPTY.with(Button::Jump);

    let result = replay(&mut fl, &log).unwrap();
    assert!(!result.completed);
    assert_eq!(result.frames_replayed, 20);
    let divergence = result.first_divergence.unwrap();
    assert_eq!(divergence.frame, 20);
    assert_eq!(divergence.expected_hash, log.checkpoints[2].state_hash);
    assert_ne!(divergence.actual_hash, divergence.expected_hash);
}

#[test]
fn tampered_checkpoint_is_reported() {
    let mut fl = running(level_grid().into());
    let mut log = record(&mut fl, 40, 10);
    log.checkpoints[3].state_hash = "0".repeat(64);

    let result = replay(&mut fl, &log).unwrap();
    let divergence = result.first_divergence.unwrap();
    assert_eq!(divergence.frame, 30);
    assert_eq!(result.frames_replayed, 30);
}

#[test]
fn duplicate_checkpoints_are_rejected_before_restore() {
    let mut fl = running(level_grid().into());
    let mut log = record(&mut fl, 20, 10);
    log.checkpoints.push(log.checkpoints[0].clone());

    let before = fl.state_hash();
    assert!(replay(&mut fl, &log).is_err());
    assert_eq!(fl.state_hash(), before);
}

#[test]
fn corrupted_snapshot_fails_replay() {
    let mut fl = running(level_grid().into());
    let mut log = record(&mut fl, 10, 5);
    log.initial_snapshot.world.camera.x += 1.0;
    assert!(replay(&mut fl, &log).is_err());
}

#[test]
fn replay_log_json_round_trip() {
    let mut fl = running(level_grid().into());
    let log = record(&mut fl, 90, 15);
    let final_hash = fl.state_hash();

    let json = serde_json::to_string(&log).unwrap();
    let back: ReplayLog = serde_json::from_str(&json).unwrap();
    assert_eq!(back.frames, log.frames);
    assert_eq!(back.checkpoints, log.checkpoints);

    let mut other = running(level_grid().into());
    let result = replay(&mut other, &back).unwrap();
    assert!(result.completed);
    assert!(result.first_divergence.is_none());
    assert_eq!(other.state_hash(), final_hash);
}

#[test]
fn chunked_world_replays_deterministically() {
    let dense = level_grid();
    let mut chunked = ChunkedGrid::new(dense.width(), dense.height());
    for ty in 0..dense.height() {
        for tx in 0..dense.width() {
            chunked.set_tile(tx, ty, dense.tile_at(tx, ty));
        }
    }

    let mut fl = running(chunked.into());
    let log = record(&mut fl, 100, 20);
    let final_hash = fl.state_hash();

    let json = serde_json::to_string(&log).unwrap();
    let back: ReplayLog = serde_json::from_str(&json).unwrap();
    let result = replay(&mut fl, &back).unwrap();
    assert!(result.completed);
    assert_eq!(fl.state_hash(), final_hash);
}

#[test]
fn replay_starting_mid_run_uses_snapshot_frame_counter() {
    let mut fl = running(level_grid().into());
    fl.run_frames(25, 1.0 / 60.0);

    let mut recorder = ReplayRecorder::new(fl.capture_snapshot(), 5);
    for _ in 0..30 {
        let dt = 1.0 / 60.0;
        fl.set_input(ButtonSet::EMPTY.with(Button::Left));
        recorder.record_frame(fl.frame_count(), fl.current_input(), dt, Some(fl.state_hash()));
        fl.frame(dt);
    }
    let log = recorder.finish();
    assert_eq!(log.checkpoints[0].frame, 25);

    let result = replay(&mut fl, &log).unwrap();
    assert!(result.completed);
    assert_eq!(fl.frame_count(), 55);
}
