//! Coarse behavioral modes reported by the avatar host.

use serde::{Deserialize, Serialize};

/// What the avatar host is currently doing.
///
/// Scales idle-motion intensity and selects which gestures the idle cycle
/// rotates through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityState {
    #[default]
    Idle,
    Talking,
    Listening,
    Thinking,
}

impl ActivityState {
    pub const ALL: [ActivityState; 4] = [
        ActivityState::Idle,
        ActivityState::Talking,
        ActivityState::Listening,
        ActivityState::Thinking,
    ];

    /// Gesture names the idle cycle rotates through in this state.
    pub fn idle_gestures(&self) -> &'static [&'static str] {
        match self {
            ActivityState::Idle => &[],
            ActivityState::Listening => &["head_tilt"],
            ActivityState::Thinking => &["sway"],
            ActivityState::Talking => &["hand_wave", "shoulder_shrug"],
        }
    }
}

impl std::fmt::Display for ActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityState::Idle => write!(f, "idle"),
            ActivityState::Talking => write!(f, "talking"),
            ActivityState::Listening => write!(f, "listening"),
            ActivityState::Thinking => write!(f, "thinking"),
        }
    }
}
