//! Sprite animations and the per-entity animation state machine.
//!
//! An [`Animation`] is a contiguous sprite-id range played at a fixed frame
//! duration, either looping or holding its last frame. [`AnimationState`]
//! tracks which animation an entity plays, the time left on the current
//! frame and the sprite currently shown.

use serde::{Deserialize, Serialize};

/// Seconds each sprite frame stays on screen.
pub const FRAME_TIME: f32 = 0.1;

/// A sprite-id range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub start: u16,
    pub end: u16,
    /// Duration of each frame in seconds.
    pub frame_time: f32,
    /// Wrap to `start` after `end`; otherwise hold on `end`.
    pub repeat: bool,
}

/// Identifies one entry of the animation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationId {
    CaptainIdle,
    CaptainRun,
    CaptainJump,
    CaptainFall,
    CrabbyIdle,
    CrabbyRun,
}

const fn looped(start: u16, end: u16) -> Animation {
    Animation {
        start,
        end,
        frame_time: FRAME_TIME,
        repeat: true,
    }
}

const fn held(start: u16, end: u16) -> Animation {
    Animation {
        start,
        end,
        frame_time: FRAME_TIME,
        repeat: false,
    }
}

static ANIMATIONS: [Animation; 6] = [
    looped(0, 4),
    looped(5, 10),
    held(11, 13),
    held(14, 14),
    looped(15, 23),
    looped(24, 29),
];

impl AnimationId {
    /// The animation definition for this id.
    pub fn def(self) -> &'static Animation {
        &ANIMATIONS[self as usize]
    }
}

// ---------------------------------------------------------------------------
// AnimationState
// ---------------------------------------------------------------------------

/// Active animation, frame timer and current sprite of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    active: AnimationId,
    timer: f32,
    sprite: u16,
}

impl AnimationState {
    /// Start playing `id` from its first frame.
    pub fn new(id: AnimationId) -> Self {
        let def = id.def();
        Self {
            active: id,
            timer: def.frame_time,
            sprite: def.start,
        }
    }

    pub fn active(&self) -> AnimationId {
        self.active
    }

    /// Seconds left on the current frame.
    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn sprite(&self) -> u16 {
        self.sprite
    }

    /// Switch to `id`, restarting it from its first frame.
    ///
    /// Requesting the animation that is already active does nothing, so
    /// behaviors may request their animation every frame. Returns whether a
    /// switch happened.
    pub fn change(&mut self, id: AnimationId) -> bool {
        if id == self.active {
            return false;
        }
        *self = Self::new(id);
        true
    }

    /// Advance the frame timer by `dt` seconds.
    ///
    /// At most one frame advances per call. When the timer runs out the
    /// sprite steps forward, wraps or holds, and the timer restarts at the
    /// full frame duration.
    pub fn tick(&mut self, dt: f32) {
        self.timer -= dt;
        if self.timer > 0.0 {
            return;
        }
        let def = self.active.def();
        if self.sprite < def.end {
            self.sprite += 1;
        } else if def.repeat {
            self.sprite = def.start;
        }
        self.timer = def.frame_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ranges_are_well_formed() {
        for id in [
            AnimationId::CaptainIdle,
            AnimationId::CaptainRun,
            AnimationId::CaptainJump,
            AnimationId::CaptainFall,
            AnimationId::CrabbyIdle,
            AnimationId::CrabbyRun,
        ] {
            let def = id.def();
            assert!(def.start <= def.end, "{id:?}");
            assert!(def.frame_time > 0.0);
        }
    }

    #[test]
    fn looping_animation_wraps() {
        let mut state = AnimationState::new(AnimationId::CaptainIdle);
        let def = AnimationId::CaptainIdle.def();
        for expected in (def.start + 1)..=def.end {
            state.tick(FRAME_TIME);
            assert_eq!(state.sprite(), expected);
        }
        state.tick(FRAME_TIME);
        assert_eq!(state.sprite(), def.start);
    }

    #[test]
    fn held_animation_stops_on_last_frame() {
        let mut state = AnimationState::new(AnimationId::CaptainJump);
        for _ in 0..10 {
            state.tick(FRAME_TIME);
        }
        assert_eq!(state.sprite(), AnimationId::CaptainJump.def().end);
        assert_eq!(state.timer(), FRAME_TIME);
    }

    #[test]
    fn partial_tick_keeps_frame() {
        let mut state = AnimationState::new(AnimationId::CrabbyRun);
        state.tick(0.04);
        assert_eq!(state.sprite(), 24);
        assert!((state.timer() - 0.06).abs() < 1e-6);
    }

    #[test]
    fn rerequesting_active_animation_keeps_timer() {
        let mut a = AnimationState::new(AnimationId::CaptainRun);
        a.change(AnimationId::CaptainIdle);
        a.tick(0.05);
        assert!(!a.change(AnimationId::CaptainIdle));

        let mut b = AnimationState::new(AnimationId::CaptainRun);
        b.change(AnimationId::CaptainIdle);
        b.tick(0.05);

        assert_eq!(a, b);
    }

    #[test]
    fn switching_restarts_from_first_frame() {
        let mut state = AnimationState::new(AnimationId::CaptainIdle);
        state.tick(FRAME_TIME);
        state.tick(FRAME_TIME);
        assert!(state.change(AnimationId::CaptainRun));
        assert_eq!(state.sprite(), 5);
        assert_eq!(state.timer(), FRAME_TIME);
    }
}
