//! The [`SlotMap`] owns every stored value and hands out [`Handle`]s.
//!
//! Storage is a flat `Vec` of slots. Vacated slot indices are recycled in
//! FIFO order so generations spread out over time rather than piling up on a
//! single hot index. Live slots are linked in insertion order through
//! `prev`/`next` indices; the links are structural only and never own data.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::SlotError;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot<T> {
    /// Current generation of this slot. Bumped on removal.
    generation: u32,
    /// The stored value, `None` while the slot is vacant.
    value: Option<T>,
    /// Previous live slot in iteration order.
    prev: Option<u32>,
    /// Next live slot in iteration order.
    next: Option<u32>,
}

// ---------------------------------------------------------------------------
// SlotMap
// ---------------------------------------------------------------------------

/// Generational storage with insertion-ordered iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMap<T> {
    slots: Vec<Slot<T>>,
    /// Vacant slot indices, recycled front-first.
    free: VecDeque<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> SlotMap<T> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Create an empty map with room for `capacity` values before the slot
    /// vector reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Store `value` and append it to the end of the iteration order.
    pub fn insert(&mut self, value: T) -> Handle {
        let index = match self.free.pop_front() {
            Some(index) => index,
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                    prev: None,
                    next: None,
                });
                index
            }
        };

        let tail = self.tail;
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        slot.prev = tail;
        slot.next = None;
        let generation = slot.generation;

        match tail {
            Some(t) => self.slots[t as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        Handle::new(index, generation)
    }

    /// Remove and return the value behind `handle`.
    ///
    /// The slot's generation is bumped so `handle` (and every copy of it)
    /// becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::StaleHandle`] if the handle does not refer to a
    /// live value. The map is left untouched in that case.
    pub fn remove(&mut self, handle: Handle) -> Result<T, SlotError> {
        if !self.contains(handle) {
            tracing::debug!(%handle, "remove: stale handle");
            return Err(SlotError::StaleHandle { handle });
        }

        let index = handle.index();
        let (prev, next, value) = {
            let slot = &mut self.slots[index as usize];
            let value = slot.value.take();
            let links = (slot.prev.take(), slot.next.take());
            slot.generation = slot.generation.wrapping_add(1);
            (links.0, links.1, value)
        };

        match prev {
            Some(p) => self.slots[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n as usize].prev = prev,
            None => self.tail = prev,
        }

        self.free.push_back(index);
        self.len -= 1;

        value.ok_or(SlotError::StaleHandle { handle })
    }

    /// Returns `true` if `handle` refers to a live value.
    pub fn contains(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|slot| slot.generation == handle.generation() && slot.value.is_some())
    }

    /// Shared access to the value behind `handle`.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable access to the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map holds no live values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first live handle in iteration order.
    pub fn first(&self) -> Option<Handle> {
        self.head.map(|index| self.handle_at(index))
    }

    /// The last live handle in iteration order.
    pub fn last(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle_at(index))
    }

    /// The successor of `handle` in iteration order.
    ///
    /// Returns `None` at the end of the order or if `handle` is stale. Read
    /// the successor before removing `handle` when walking and mutating.
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index() as usize]
            .next
            .map(|index| self.handle_at(index))
    }

    /// Iterate live `(handle, &value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            map: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Collect the live handles in iteration order.
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Remove every value, returning them in iteration order.
    ///
    /// All outstanding handles become stale. Slots are kept for reuse.
    pub fn drain(&mut self) -> Vec<(Handle, T)> {
        let mut drained = Vec::with_capacity(self.len);
        while let Some(handle) = self.first() {
            match self.remove(handle) {
                Ok(value) => drained.push((handle, value)),
                Err(_) => break,
            }
        }
        drained
    }

    /// Verify the iteration links.
    ///
    /// Walks the order from its head and checks that every visited slot is
    /// occupied, back-links agree, the walk terminates (no cycles), and the
    /// visited count equals both `len` and the number of occupied slots.
    /// The free list must name each vacant slot exactly once.
    /// Intended for maps that were deserialized from untrusted data.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::BrokenLinks`] describing the first inconsistency.
    pub fn check_links(&self) -> Result<(), SlotError> {
        let broken = |details: String| Err(SlotError::BrokenLinks { details });

        let occupied = self.slots.iter().filter(|s| s.value.is_some()).count();
        if occupied != self.len {
            return broken(format!(
                "{occupied} occupied slots but len is {}",
                self.len
            ));
        }

        let mut visited = 0usize;
        let mut prev: Option<u32> = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let Some(slot) = self.slots.get(index as usize) else {
                return broken(format!("link points past the end at index {index}"));
            };
            if slot.value.is_none() {
                return broken(format!("linked slot {index} is vacant"));
            }
            if slot.prev != prev {
                return broken(format!(
                    "slot {index} back-link is {:?}, expected {prev:?}",
                    slot.prev
                ));
            }
            visited += 1;
            if visited > self.len {
                return broken(format!("cycle detected through slot {index}"));
            }
            prev = Some(index);
            cursor = slot.next;
        }

        if visited != self.len {
            return broken(format!("walked {visited} slots but len is {}", self.len));
        }
        if prev != self.tail {
            return broken(format!("tail is {:?} but walk ended at {prev:?}", self.tail));
        }

        let mut seen = vec![false; self.slots.len()];
        for &index in &self.free {
            match self.slots.get(index as usize) {
                None => return broken(format!("free index {index} is out of range")),
                Some(slot) if slot.value.is_some() => {
                    return broken(format!("free index {index} is occupied"));
                }
                Some(_) if seen[index as usize] => {
                    return broken(format!("free index {index} is listed twice"));
                }
                Some(_) => seen[index as usize] = true,
            }
        }
        if self.free.len() + self.len != self.slots.len() {
            return broken(format!(
                "{} free + {} live does not cover {} slots",
                self.free.len(),
                self.len,
                self.slots.len()
            ));
        }
        Ok(())
    }

    fn handle_at(&self, index: u32) -> Handle {
        Handle::new(index, self.slots[index as usize].generation)
    }
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Iter
// ---------------------------------------------------------------------------

/// Iterator over live `(handle, &value)` pairs, in insertion order.
pub struct Iter<'a, T> {
    map: &'a SlotMap<T>,
    cursor: Option<u32>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.map.slots[index as usize];
        self.cursor = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        let value = slot.value.as_ref()?;
        Some((Handle::new(index, slot.generation), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<'a, T> IntoIterator for &'a SlotMap<T> {
    type Item = (Handle, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
