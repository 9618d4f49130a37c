//! Generational handles.
//!
//! A [`Handle`] names a slot and the generation the slot had when the value
//! was inserted. The owning [`SlotMap`](crate::slot_map::SlotMap) bumps a
//! slot's generation every time its value is removed, so a handle kept past a
//! removal never resolves to whatever later reuses the slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generational reference into a [`SlotMap`](crate::slot_map::SlotMap).
///
/// Ordering is by slot index first, which matches storage order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot position inside the map.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({self})")
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}
