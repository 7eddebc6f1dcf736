/*
 * The event flags through which the monitors talk to each other.
 *
 * There is no queue and no wake-up: each task polls, reads the flags it cares
 * about, and sets or clears the flags it owns. Readers may see any mix of a
 * writer's updates from the same tick, which the polling loops tolerate by
 * re-deriving their decisions on every tick.
 */

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

/// A copy of the three flags taken at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    pub crossing_requested: bool,
    pub crossing_active: bool,
    pub illegal_detected: bool,
}

pub struct SharedEventState {
    crossing_requested: AtomicBool,
    crossing_active: AtomicBool,
    illegal_detected: AtomicBool,
    // Cortex-M3 has no 64-bit atomics.
    ignore_until: Mutex<CriticalSectionRawMutex, Cell<u64>>,
}

impl SharedEventState {
    pub const fn new() -> Self {
        SharedEventState {
            crossing_requested: AtomicBool::new(false),
            crossing_active: AtomicBool::new(false),
            illegal_detected: AtomicBool::new(false),
            ignore_until: Mutex::new(Cell::new(0)),
        }
    }

    pub fn snapshot(&self) -> EventFlags {
        EventFlags {
            crossing_requested: self.crossing_requested(),
            crossing_active: self.crossing_active(),
            illegal_detected: self.illegal_detected(),
        }
    }

    pub fn crossing_requested(&self) -> bool {
        self.crossing_requested.load(Ordering::Relaxed)
    }

    pub fn set_crossing_requested(&self, requested: bool) {
        self.crossing_requested.store(requested, Ordering::Relaxed);
    }

    pub fn crossing_active(&self) -> bool {
        self.crossing_active.load(Ordering::Relaxed)
    }

    pub fn set_crossing_active(&self, active: bool) {
        self.crossing_active.store(active, Ordering::Relaxed);
    }

    pub fn illegal_detected(&self) -> bool {
        self.illegal_detected.load(Ordering::Relaxed)
    }

    /// Stores the flag and returns its previous value.
    pub fn set_illegal_detected(&self, detected: bool) -> bool {
        self.illegal_detected.swap(detected, Ordering::Relaxed)
    }

    pub fn ignore_until(&self) -> u64 {
        self.ignore_until.lock(|until| until.get())
    }

    pub fn set_ignore_until(&self, until_ms: u64) {
        self.ignore_until.lock(|until| until.set(until_ms));
    }

    /// Whether illegal-crossing detection is still cooling down at `now_ms`.
    pub fn is_suppressed(&self, now_ms: u64) -> bool {
        now_ms < self.ignore_until()
    }
}

impl Default for SharedEventState {
    fn default() -> Self {
        Self::new()
    }
}
