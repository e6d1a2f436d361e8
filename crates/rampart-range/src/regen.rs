//! Regeneration observation ring buffer.
//!
//! Each heartbeat records one boolean observation per side: whether the
//! price sat on the side of the moving average favorable to restoring that
//! side's wall. A depleted wall regenerates once enough favorable
//! observations accumulate within the window *and* enough time has passed
//! since the last regeneration. Both conditions are independently required.

use rampart_types::Side;
use serde::{Deserialize, Serialize};

/// Regeneration observations for one side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenStatus {
    count: u32,
    last_regen: u64,
    next_observation: usize,
    observations: Vec<bool>,
}

impl RegenStatus {
    /// Create an empty window of `window` observations, with the last
    /// regeneration considered to have happened at `now`.
    pub fn new(window: usize, now: u64) -> Self {
        Self {
            count: 0,
            last_regen: now,
            next_observation: 0,
            observations: vec![false; window],
        }
    }

    /// Number of favorable observations currently in the window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Timestamp of the last regeneration.
    pub fn last_regen(&self) -> u64 {
        self.last_regen
    }

    /// Window length.
    pub fn window(&self) -> usize {
        self.observations.len()
    }

    /// Record one observation, overwriting the oldest slot.
    ///
    /// The count moves only on an actual value transition; overwriting a
    /// slot with the same value leaves it unchanged, which prevents double
    /// counting.
    pub fn observe(&mut self, favorable: bool) {
        let slot = self.next_observation;
        let displaced = self.observations[slot];
        if favorable && !displaced {
            self.count += 1;
        } else if !favorable && displaced {
            self.count -= 1;
        }
        self.observations[slot] = favorable;
        self.next_observation = (slot + 1) % self.observations.len();
    }

    /// Whether the side may be regenerated.
    ///
    /// Requires both `now >= last_regen + regen_wait` and
    /// `count >= regen_threshold`.
    pub fn eligible(&self, now: u64, regen_wait: u64, regen_threshold: u32) -> bool {
        now >= self.last_regen.saturating_add(regen_wait) && self.count >= regen_threshold
    }

    /// Clear all observations and record a regeneration at `now`.
    pub fn reset(&mut self, now: u64) {
        self.count = 0;
        self.next_observation = 0;
        self.observations.fill(false);
        self.last_regen = now;
    }

    /// Resize the window, clearing all observations.
    pub fn resize(&mut self, window: usize, now: u64) {
        self.observations = vec![false; window];
        self.count = 0;
        self.next_observation = 0;
        self.last_regen = now;
    }
}

/// Whether `current_price` vs `moving_average` counts toward regenerating
/// `side`.
///
/// A price on the *opposite* side of center from the wall is favorable: the
/// low wall regenerates while price holds at or above the moving average,
/// the high wall while price holds at or below it.
pub fn favorable(side: Side, current_price: u128, moving_average: u128) -> bool {
    match side {
        Side::Low => current_price >= moving_average,
        Side::High => current_price <= moving_average,
    }
}
