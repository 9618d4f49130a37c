//! Recording a run as per-frame input and playing it back against hashes.
//!
//! A frame-rate-independent simulation is only reproducible if every frame's
//! delta is replayed too, so the [`ReplayRecorder`] stores one
//! [`FrameRecord`] (delta plus held buttons) per frame, and a state hash
//! checkpoint every few frames. [`replay`] restores the initial snapshot,
//! feeds the recorded frames back and compares hashes at each checkpoint.
//!
//! # Recording and replaying
//!
//! ```
//! use corsair_engine::prelude::*;
//!
//! let mut grid = DenseGrid::new(12, 6);
//! grid.fill_rect(0, 5, 11, 5, TileId::GRASS);
//! grid.set_tile(2, 4, TileId::CAPTAIN);
//! let mut world = World::new(grid.into(), SimConfig::default()).unwrap();
//! world.start();
//! let mut frames = FrameLoop::new(world);
//!
//! let mut recorder = ReplayRecorder::new(frames.capture_snapshot(), 10);
//! for i in 0..60u64 {
//!     let buttons = if i < 30 { ButtonSet::EMPTY.with(Button::Right) } else { ButtonSet::EMPTY };
//!     let dt = if i % 2 == 0 { 1.0 / 60.0 } else { 1.0 / 30.0 };
//!     frames.set_input(buttons);
//!     recorder.record_frame(frames.frame_count(), buttons, dt, Some(frames.state_hash()));
//!     frames.frame(dt);
//! }
//! let log = recorder.finish();
//!
//! let result = replay(&mut frames, &log).unwrap();
//! assert!(result.completed);
//! assert!(result.first_divergence.is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::frame::FrameLoop;
use crate::input::ButtonSet;
use crate::snapshot::FrameSnapshot;

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// Input for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Raw frame delta in seconds, before clamping.
    pub dt: f32,
    pub buttons: ButtonSet,
}

/// A state hash recorded before a frame executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub frame: u64,
    /// BLAKE3 hex digest of the state at this frame.
    pub state_hash: String,
}

/// A complete replay log: initial snapshot, every frame's input and the
/// checkpoints.
///
/// The log is fully serializable to JSON for storage or regression fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    /// State the run started from.
    pub initial_snapshot: FrameSnapshot,
    /// One record per frame, starting at the snapshot's frame counter.
    pub frames: Vec<FrameRecord>,
    pub checkpoints: Vec<Checkpoint>,
}

// ---------------------------------------------------------------------------
// ReplayResult
// ---------------------------------------------------------------------------

/// The outcome of replaying a [`ReplayLog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Whether every recorded frame was replayed.
    pub completed: bool,
    pub frames_replayed: u64,
    /// The first checkpoint whose hash did not match. `None` if the replay
    /// was deterministic.
    pub first_divergence: Option<ReplayDivergence>,
}

/// The first checkpoint whose recomputed hash differed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub frame: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Records a run into a [`ReplayLog`].
///
/// Call [`record_frame`](Self::record_frame) *before* each frame executes,
/// after setting that frame's input, then [`finish`](Self::finish).
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many frames; 0 checkpoints whenever a hash is
    /// supplied.
    checkpoint_interval: u64,
    /// Frame number expected on the next call.
    next_frame: u64,
}

impl ReplayRecorder {
    pub fn new(snapshot: FrameSnapshot, checkpoint_interval: u64) -> Self {
        let next_frame = snapshot.frame_counter;
        Self {
            log: ReplayLog {
                initial_snapshot: snapshot,
                frames: Vec::new(),
                checkpoints: Vec::new(),
            },
            checkpoint_interval,
            next_frame,
        }
    }

    /// Record one frame.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not the frame following the previous call (the
    /// first call must use the snapshot's frame counter). Every frame must be
    /// recorded because each carries its own delta.
    pub fn record_frame(&mut self, frame: u64, buttons: ButtonSet, dt: f32, state_hash: Option<String>) {
        assert_eq!(
            frame, self.next_frame,
            "ReplayRecorder::record_frame: expected frame {}, got {frame}",
            self.next_frame
        );
        self.next_frame += 1;
        self.log.frames.push(FrameRecord { dt, buttons });

        if let Some(state_hash) = state_hash {
            let due = self.checkpoint_interval == 0 || frame % self.checkpoint_interval == 0;
            if due {
                self.log.checkpoints.push(Checkpoint { frame, state_hash });
            }
        }
    }

    pub fn finish(self) -> ReplayLog {
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Replay `log` on `frames`, verifying determinism at each checkpoint.
///
/// Stops at the first divergence. Malformed logs (duplicate or out-of-range
/// checkpoints) are rejected before `frames` is touched.
pub fn replay(frames: &mut FrameLoop, log: &ReplayLog) -> anyhow::Result<ReplayResult> {
    let start = log.initial_snapshot.frame_counter;
    let end = start
        .checked_add(log.frames.len() as u64)
        .ok_or_else(|| anyhow::anyhow!("frame range overflow starting at frame {start}"))?;

    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();
    for cp in &log.checkpoints {
        if !(start..end).contains(&cp.frame) {
            return Err(anyhow::anyhow!(
                "checkpoint at frame {} lies outside the recorded range {start}..{end}",
                cp.frame
            ));
        }
        if checkpoints.insert(cp.frame, cp.state_hash.as_str()).is_some() {
            return Err(anyhow::anyhow!(
                "replay log contains duplicate checkpoint at frame {}",
                cp.frame
            ));
        }
    }

    frames
        .restore_from_snapshot(&log.initial_snapshot)
        .map_err(|e| anyhow::anyhow!("replay cannot start from its snapshot: {e}"))?;

    let mut frames_replayed = 0u64;
    for (frame, record) in (start..end).zip(&log.frames) {
        // The recorded hash was taken after the input was set.
        frames.set_input(record.buttons);

        if let Some(&expected) = checkpoints.get(&frame) {
            let actual = frames.state_hash();
            if actual != expected {
                tracing::warn!(frame, expected, actual = %actual, "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    frames_replayed,
                    first_divergence: Some(ReplayDivergence {
                        frame,
                        expected_hash: expected.to_owned(),
                        actual_hash: actual,
                    }),
                });
            }
        }

        frames.frame(record.dt);
        frames_replayed += 1;
    }

    Ok(ReplayResult {
        completed: true,
        frames_replayed,
        first_divergence: None,
    })
}
