//! Interpolation and easing primitives.
//!
//! Everything that blends poses goes through here: scalar lerp, the easing
//! set, per-bone pose blending over the union of key sets, and the
//! `BlendController` tracking one blend's lifecycle.

use serde::{Deserialize, Serialize};

use crate::pose::{BoneRotation, Pose};

/// Linear interpolation between two scalars.
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Easing curve applied to blend progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    pub const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
    ];

    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "linear" => Easing::Linear,
            "ease_in" | "easein" => Easing::EaseIn,
            "ease_out" | "easeout" => Easing::EaseOut,
            "ease_in_out" | "easeinout" => Easing::EaseInOut,
            _ => Easing::EaseInOut,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease_in",
            Easing::EaseOut => "ease_out",
            Easing::EaseInOut => "ease_in_out",
        }
    }

    /// Evaluate the curve at `t`, clamped into [0, 1].
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Blend two poses at eased progress `t`.
///
/// The result carries the union of both key sets; a bone present on only
/// one side blends against zero rotation for the other.
pub fn blend_pose(from: &Pose, to: &Pose, t: f32, easing: Easing) -> Pose {
    let eased = easing.ease(t);
    let mut out = Pose::new();
    for name in from.bone_names().chain(to.bone_names()) {
        if out.contains(name) {
            continue;
        }
        let a = from.get(name);
        let b = to.get(name);
        out.set(
            name,
            BoneRotation::new(
                lerp(a.x, b.x, eased),
                lerp(a.y, b.y, eased),
                lerp(a.z, b.z, eased),
            ),
        );
    }
    out
}

/// Tracks one pose blend from start to completion.
#[derive(Debug, Clone)]
pub struct BlendController {
    from: Pose,
    to: Pose,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl BlendController {
    pub fn new(from: Pose, to: Pose, duration: f32) -> Self {
        Self::with_easing(from, to, duration, Easing::EaseInOut)
    }

    pub fn with_easing(from: Pose, to: Pose, duration: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.001),
            elapsed: 0.0,
            easing,
        }
    }

    /// Advance by `dt` seconds; elapsed never exceeds the duration.
    pub fn update(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
    }

    /// Blend progress in [0, 1].
    pub fn progress(&self) -> f32 {
        self.elapsed / self.duration
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Rewind to the start, keeping endpoints and duration.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// The blended pose at the current progress.
    pub fn current_pose(&self) -> Pose {
        blend_pose(&self.from, &self.to, self.progress(), self.easing)
    }

    /// The blended pose at an arbitrary progress value.
    pub fn pose_at(&self, t: f32) -> Pose {
        blend_pose(&self.from, &self.to, t, self.easing)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn from_pose(&self) -> &Pose {
        &self.from
    }

    pub fn to_pose(&self) -> &Pose {
        &self.to
    }
}
