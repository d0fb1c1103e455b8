//! Slot arena with a free-list for short-lived entities
//!
//! Entities are allocated once, up front, and recycled by slot. Slot
//! membership (free or in use) is the ground truth; the entity's own
//! `active` flag only mirrors it.

use serde::{Deserialize, Serialize};

/// Handle to a pool slot. Identity is the slot, not the entity contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Anything a [`Pool`] can hold
pub trait Recyclable: Default {
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

/// Fixed-type object pool
#[derive(Debug, Clone)]
pub struct Pool<T: Recyclable> {
    slots: Vec<T>,
    in_use: Vec<bool>,
    /// Free slot indices (LIFO, so recently released slots are reused first)
    available: Vec<u32>,
    in_use_count: usize,
}

impl<T: Recyclable> Pool<T> {
    /// Create a pool with `initial_size` pre-allocated, inactive entities
    pub fn new(initial_size: usize) -> Self {
        let mut slots = Vec::with_capacity(initial_size);
        slots.resize_with(initial_size, T::default);
        for slot in &mut slots {
            slot.set_active(false);
        }
        // Reverse order so the first acquire hands out slot 0
        let available = (0..initial_size as u32).rev().collect();
        Self {
            slots,
            in_use: vec![false; initial_size],
            available,
            in_use_count: 0,
        }
    }

    /// Take an entity out of the pool, growing it if every slot is in use
    ///
    /// The entity comes back with `active = true` and whatever state it had
    /// when it was released; the caller is expected to initialise it.
    pub fn acquire(&mut self) -> (SlotId, &mut T) {
        let index = match self.available.pop() {
            Some(index) => index as usize,
            None => {
                self.slots.push(T::default());
                self.in_use.push(false);
                self.slots.len() - 1
            }
        };

        self.in_use[index] = true;
        self.in_use_count += 1;
        let entity = &mut self.slots[index];
        entity.set_active(true);
        (SlotId(index as u32), entity)
    }

    /// Return a slot to the pool. Returns `false` (and does nothing) when the
    /// slot is not currently in use, so releasing twice is harmless.
    pub fn release(&mut self, id: SlotId) -> bool {
        let index = id.index();
        if !self.in_use.get(index).copied().unwrap_or(false) {
            return false;
        }
        self.in_use[index] = false;
        self.in_use_count -= 1;
        self.slots[index].set_active(false);
        self.available.push(id.0);
        true
    }

    /// Release every slot currently in use
    pub fn release_all(&mut self) {
        for index in 0..self.slots.len() {
            if self.in_use[index] {
                self.in_use[index] = false;
                self.slots[index].set_active(false);
                self.available.push(index as u32);
            }
        }
        self.in_use_count = 0;
    }

    /// Borrow an in-use entity
    #[inline]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        if self.is_in_use(id) {
            self.slots.get(id.index())
        } else {
            None
        }
    }

    /// Mutably borrow an in-use entity
    #[inline]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        if self.is_in_use(id) {
            self.slots.get_mut(id.index())
        } else {
            None
        }
    }

    #[inline]
    pub fn is_in_use(&self, id: SlotId) -> bool {
        self.in_use.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of entities currently handed out
    pub fn active_count(&self) -> usize {
        self.in_use_count
    }

    /// Number of entities waiting on the free-list
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Total entities ever allocated by this pool
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
