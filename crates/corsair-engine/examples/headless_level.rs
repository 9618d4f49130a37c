//! Headless level run.
//!
//! Builds a small level from an ASCII map, plays a scripted run through it
//! while recording a replay, prints the sprite list every half second and
//! finally verifies that the recorded replay reproduces the run.
//!
//! Run with: `cargo run --example headless_level`
//! Set `RUST_LOG=corsair_engine=debug` to see entity lifecycle events.

use corsair_engine::prelude::*;

const LEVEL: &[&str] = &[
    "..............................",
    "..............................",
    "..............................",
    "..................###.........",
    "..............................",
    ".C.........#.........X....#...",
    "gggggggggggggggg...ggggggggggg",
    "GGGGGGGGGGGGGGGG...GGGGGGGGGGG",
];

const FRAMES: u64 = 300;
const DT: f32 = 1.0 / 60.0;

fn parse_level(rows: &[&str]) -> anyhow::Result<DenseGrid> {
    let height = rows.len() as i32;
    let width = rows.first().map_or(0, |r| r.len()) as i32;
    let mut grid = DenseGrid::new(width, height);
    for (ty, row) in rows.iter().enumerate() {
        anyhow::ensure!(row.len() as i32 == width, "row {ty} has length {}, expected {width}", row.len());
        for (tx, ch) in row.chars().enumerate() {
            let id = match ch {
                '.' => TileId::BLANK,
                '#' => TileId::SOLID,
                'g' => TileId::GRASS,
                'G' => TileId::GROUND,
                'C' => TileId::CAPTAIN,
                'X' => TileId::CRABBY,
                other => anyhow::bail!("unknown tile '{other}' at ({tx}, {ty})"),
            };
            grid.set_tile(tx as i32, ty as i32, id);
        }
    }
    Ok(grid)
}

/// Run right, hop the block at column 11 and the gap at column 16.
fn script(frame: u64) -> ButtonSet {
    let mut buttons = ButtonSet::EMPTY;
    if frame < 240 {
        buttons.insert(Button::Right);
    }
    if (80..84).contains(&frame) || (150..154).contains(&frame) {
        buttons.insert(Button::Jump);
    }
    buttons
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let grid = parse_level(LEVEL)?;
    let mut world = World::new(grid.into(), SimConfig::default())?;
    let spawned = world.start();
    println!("spawned {spawned} entities");

    let mut frames = FrameLoop::new(world);
    let mut recorder = ReplayRecorder::new(frames.capture_snapshot(), 30);

    for i in 0..FRAMES {
        let buttons = script(i);
        frames.set_input(buttons);
        recorder.record_frame(frames.frame_count(), buttons, DT, Some(frames.state_hash()));
        let diag = frames.frame(DT);
        let camera_clamped = diag.camera_clamped;

        if i % 30 == 0 {
            let cam = frames.world().camera();
            println!(
                "frame {:>3}  camera ({:5.2}, {:5.2}){}",
                frames.frame_count(),
                cam.x,
                cam.y,
                if camera_clamped { "  [clamped]" } else { "" }
            );
            for sprite in frames.world().sprites() {
                println!(
                    "    {}  pos ({:6.2}, {:5.2})  sprite {:>2}{}",
                    sprite.handle,
                    sprite.position.x,
                    sprite.position.y,
                    sprite.sprite,
                    if sprite.flipped { "  flipped" } else { "" }
                );
            }
        }
    }

    let final_hash = frames.state_hash();
    let log = recorder.finish();
    println!(
        "recorded {} frames, {} checkpoints",
        log.frames.len(),
        log.checkpoints.len()
    );

    let result = replay(&mut frames, &log)?;
    anyhow::ensure!(
        result.first_divergence.is_none(),
        "replay diverged: {:?}",
        result.first_divergence
    );
    anyhow::ensure!(frames.state_hash() == final_hash, "replay ended in a different state");
    let short: String = final_hash.chars().take(16).collect();
    println!("replay verified: {} frames, hash {short}", result.frames_replayed);

    frames.world_mut().stop();
    Ok(())
}
