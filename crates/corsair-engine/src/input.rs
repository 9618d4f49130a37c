//! Per-frame button state.
//!
//! The windowing layer hands the core a [`ButtonSet`] of held buttons once
//! per frame. [`InputState`] turns that into per-button press counts: a
//! count increments every frame the button is held and resets to zero on
//! release, so a count of exactly one marks the frame of the press.

use serde::{Deserialize, Serialize};

/// A logical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Left,
    Right,
    Jump,
}

impl Button {
    pub const COUNT: usize = 3;
    pub const ALL: [Button; Button::COUNT] = [Button::Left, Button::Right, Button::Jump];

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of held buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: ButtonSet = ButtonSet(0);

    /// Builder-style insert.
    pub fn with(mut self, button: Button) -> Self {
        self.insert(button);
        self
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.bit();
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !button.bit();
    }

    pub fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(ButtonSet::EMPTY, ButtonSet::with)
    }
}

/// Press counts per button.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    counts: [u32; Button::COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold this frame's held buttons into the press counts.
    pub fn update(&mut self, held: ButtonSet) {
        for button in Button::ALL {
            let count = &mut self.counts[button as usize];
            *count = if held.contains(button) {
                count.saturating_add(1)
            } else {
                0
            };
        }
    }

    /// Number of consecutive frames `button` has been held.
    pub fn press_count(&self, button: Button) -> u32 {
        self.counts[button as usize]
    }

    pub fn held(&self, button: Button) -> bool {
        self.press_count(button) > 0
    }

    /// Whether `button` went down this frame.
    pub fn just_pressed(&self, button: Button) -> bool {
        self.press_count(button) == 1
    }

    /// Release every button.
    pub fn clear(&mut self) {
        self.counts = [0; Button::COUNT];
    }
}
