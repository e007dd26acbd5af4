//! Lock-free append buffer for parallel survivor collection

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Pre-sized buffer that many workers append to concurrently
///
/// Each `push` reserves one position through an atomic counter, so writers
/// never touch the same slot. The buffer is only resized between passes
/// (`reset` takes `&mut self`), never while workers are appending.
#[derive(Debug, Default)]
pub struct AppendBuffer {
    slots: Vec<AtomicU32>,
    len: AtomicUsize,
}

impl AppendBuffer {
    /// Create a buffer with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::default();
        buffer.reset(capacity);
        buffer
    }

    /// Empty the buffer and make room for at least `capacity` values
    pub fn reset(&mut self, capacity: usize) {
        if self.slots.len() < capacity {
            self.slots.resize_with(capacity, || AtomicU32::new(0));
        }
        *self.len.get_mut() = 0;
    }

    /// Append a value; returns `false` when the buffer is full
    pub fn push(&self, value: u32) -> bool {
        let index = self.len.fetch_add(1, Ordering::Relaxed);
        match self.slots.get(index) {
            Some(slot) => {
                slot.store(value, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Number of values stored
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire).min(self.slots.len())
    }

    /// Whether nothing has been appended since the last reset
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stored values in reservation order
    ///
    /// Only meaningful once every writer of the pass has been joined.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots[..self.len()].iter().map(|slot| slot.load(Ordering::Relaxed))
    }
}
