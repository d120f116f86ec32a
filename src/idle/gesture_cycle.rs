//! Idle-gesture cycling.
//!
//! While the host is active and quiet, rotates through a small
//! per-activity list of gesture names on a fixed cadence. Each cycle slot
//! dispatches its gesture exactly once.

use crate::activity::ActivityState;

/// Slots advance at this rate, in slots per second.
const CYCLE_RATE: f32 = 0.5;
/// Voice volume at or above this suppresses idle gestures.
const VOLUME_GATE: f32 = 0.3;

/// The gesture selected at time `t` for `state`, or None for an empty list.
pub fn selected(t: f32, state: ActivityState) -> Option<&'static str> {
    let list = state.idle_gestures();
    if list.is_empty() {
        return None;
    }
    let index = (t.max(0.0) * CYCLE_RATE) as usize % list.len();
    Some(list[index])
}

/// Remembers the last dispatched slot so each one fires a single time.
#[derive(Debug, Clone, Default)]
pub struct GestureCycleState {
    last_slot: Option<(ActivityState, u64)>,
}

impl GestureCycleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cycle. Returns a gesture name on the first frame of each
    /// new slot while the gate passes (host active, volume below the speech
    /// gate); otherwise None.
    pub fn advance(
        &mut self,
        t: f32,
        state: ActivityState,
        host_active: bool,
        volume: f32,
    ) -> Option<&'static str> {
        if !host_active || volume >= VOLUME_GATE {
            // Forget the slot so the cycle restarts cleanly after a pause
            self.last_slot = None;
            return None;
        }

        let list = state.idle_gestures();
        if list.is_empty() {
            self.last_slot = None;
            return None;
        }

        let slot_index = (t.max(0.0) * CYCLE_RATE) as u64;
        if self.last_slot == Some((state, slot_index)) {
            return None;
        }
        self.last_slot = Some((state, slot_index));
        Some(list[slot_index as usize % list.len()])
    }
}
