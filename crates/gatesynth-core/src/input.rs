//! External input vector backed by atomic slots.
//!
//! [`InputVector`] stores the latest reading of each of the eight external
//! controls (buttons, sliders) as `f64` bits in an `AtomicU64`. An input
//! acquisition thread or process calls [`set()`](InputVector::set); parameter
//! resolution inside the render callback calls [`get()`](InputVector::get).
//!
//! Each slot is read and written atomically, so a reader never observes a torn
//! value. There is no consistency across slots and no handshake: readers see
//! whatever value each slot held at the moment it was read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::INPUT_SLOTS;

/// Shared, lock-free array of external scalar inputs.
///
/// Slots are addressed 1-based (`1..=8`) to match how patches name physical
/// controls. Cloning is cheap and every clone sees the same slots.
#[derive(Clone)]
pub struct InputVector {
    slots: Arc<[AtomicU64; INPUT_SLOTS]>,
}

impl InputVector {
    /// Creates a vector with every slot at `0.0`.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(std::array::from_fn(|_| AtomicU64::new(0.0f64.to_bits()))),
        }
    }

    /// Returns `true` if `slot` addresses a real input (`1..=8`).
    #[inline]
    pub fn is_valid_slot(slot: usize) -> bool {
        (1..=INPUT_SLOTS).contains(&slot)
    }

    /// Reads a slot. Out-of-range slots read as `0.0`.
    #[inline]
    pub fn get(&self, slot: usize) -> f64 {
        if !Self::is_valid_slot(slot) {
            return 0.0;
        }
        f64::from_bits(self.slots[slot - 1].load(Ordering::Relaxed))
    }

    /// Writes a slot. Returns `false` (and writes nothing) if out of range.
    pub fn set(&self, slot: usize, value: f64) -> bool {
        if !Self::is_valid_slot(slot) {
            return false;
        }
        self.slots[slot - 1].store(value.to_bits(), Ordering::Relaxed);
        true
    }

    /// Writes the leading slots from `values`; extra values are ignored.
    pub fn store_all(&self, values: &[f64]) {
        for (slot, &value) in self.slots.iter().zip(values) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Copies every slot. Slots are read one at a time, not as a unit.
    pub fn snapshot(&self) -> [f64; INPUT_SLOTS] {
        std::array::from_fn(|i| f64::from_bits(self.slots[i].load(Ordering::Relaxed)))
    }

    /// Resets every slot to `0.0`.
    pub fn clear(&self) {
        self.store_all(&[0.0; INPUT_SLOTS]);
    }
}

impl Default for InputVector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InputVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InputVector").field(&self.snapshot()).finish()
    }
}
