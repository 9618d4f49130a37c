//! Corsair Slots -- generational slot storage with a stable iteration order.
//!
//! A [`SlotMap`] exclusively owns its values. Each value is addressed through
//! a [`Handle`] that packs a slot index with a *generation* counter, so a
//! handle to a removed value is detected immediately instead of aliasing
//! whatever later reuses the slot.
//!
//! Live values are threaded onto a doubly-linked order through their slot
//! indices. Iteration follows insertion order, and callers that mutate the map
//! while walking it read the successor with [`SlotMap::next`] *before* acting
//! on the current handle, which keeps removal of the current value safe.
//!
//! # Quick Start
//!
//! ```
//! use corsair_slots::prelude::*;
//!
//! let mut slots = SlotMap::new();
//! let a = slots.insert("captain");
//! let b = slots.insert("crabby");
//!
//! // Walk the map, removing the current value mid-iteration.
//! let mut cursor = slots.first();
//! while let Some(handle) = cursor {
//!     cursor = slots.next(handle);
//!     if handle == a {
//!         slots.remove(handle).unwrap();
//!     }
//! }
//!
//! assert!(!slots.contains(a));
//! assert_eq!(slots.get(b), Some(&"crabby"));
//! assert_eq!(slots.len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod handle;
pub mod slot_map;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by slot storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// The handle does not refer to a live value (stale generation or never
    /// allocated).
    #[error("handle {handle:?} is stale or was never allocated")]
    StaleHandle { handle: handle::Handle },

    /// The iteration links of a (typically deserialized) map are corrupt.
    #[error("slot links are inconsistent: {details}")]
    BrokenLinks { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::handle::Handle;
    pub use crate::slot_map::{Iter, SlotMap};
    pub use crate::SlotError;
}
