//! Gesture clip definitions and the clip lookup table.
//!
//! A clip is a named target pose plus timing and intensity metadata.
//! Tables load from TOML (`[clips.<name>]` sections) or get built in code
//! and can be swapped wholesale at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::path::Path;

use crate::error::{ClipError, OdoriError};
use crate::pose::{BoneRotation, Pose};

/// Rotation axis a procedural modifier drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Add `amount` to this axis of `rotation`.
    pub fn apply(&self, rotation: &mut BoneRotation, amount: f32) {
        match self {
            Axis::X => rotation.x += amount,
            Axis::Y => rotation.y += amount,
            Axis::Z => rotation.z += amount,
        }
    }
}

/// Time-varying overlay layered onto a clip's target pose.
///
/// Evaluated fresh each time the clip starts, so repeated plays of the same
/// clip land on slightly different poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProceduralModifier {
    /// No overlay; the authored pose is used as-is.
    #[default]
    None,
    /// Bounded sinusoid on one axis of one bone.
    Sinusoid {
        bone: String,
        axis: Axis,
        /// Oscillation frequency in cycles per second.
        freq: f32,
        /// Peak offset in radians.
        amp: f32,
        #[serde(default)]
        phase_offset: f32,
    },
}

impl ProceduralModifier {
    /// Evaluate the overlay at absolute time `now` and add it into `pose`.
    pub fn apply(&self, pose: &mut Pose, now: f32) {
        match self {
            ProceduralModifier::None => {}
            ProceduralModifier::Sinusoid {
                bone,
                axis,
                freq,
                amp,
                phase_offset,
            } => {
                let offset = (now * freq * TAU + phase_offset).sin() * amp;
                let mut rotation = pose.get(bone);
                axis.apply(&mut rotation, offset);
                pose.set(bone, rotation);
            }
        }
    }
}

/// A named, pre-authored gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureClip {
    /// Unique name; also the table key.
    #[serde(default)]
    pub name: String,
    /// Disabled clips are skipped with a warning when enqueued.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Playback duration in seconds. Falls back to the enqueue argument or
    /// the configured default when absent.
    #[serde(default)]
    pub duration: Option<f32>,
    /// Componentwise scale on the target pose.
    #[serde(default = "default_1_0")]
    pub intensity: f32,
    /// Blend-in rate: multiplies blend progress, saturating at 1. At 1.0
    /// the blend spans the whole duration.
    #[serde(default = "default_1_0")]
    pub transition_speed: f32,
    /// Target pose in radians.
    #[serde(default)]
    pub pose: Pose,
    /// Optional time-varying overlay.
    #[serde(default)]
    pub procedural_modifier: ProceduralModifier,
}

fn default_true() -> bool {
    true
}

fn default_1_0() -> f32 {
    1.0
}

impl GestureClip {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            duration: None,
            intensity: 1.0,
            transition_speed: 1.0,
            pose: Pose::new(),
            procedural_modifier: ProceduralModifier::None,
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_bone(mut self, bone: &str, rotation: BoneRotation) -> Self {
        self.pose.set(bone, rotation);
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_transition_speed(mut self, speed: f32) -> Self {
        self.transition_speed = speed;
        self
    }

    pub fn with_modifier(mut self, modifier: ProceduralModifier) -> Self {
        self.procedural_modifier = modifier;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The pose this clip blends toward when started at time `now`: the
    /// authored pose scaled by intensity, plus the procedural overlay
    /// evaluated at `now`.
    pub fn resolve_target_pose(&self, now: f32) -> Pose {
        let mut pose: Pose = self
            .pose
            .iter()
            .map(|(name, rotation)| (name.to_string(), rotation.scaled(self.intensity)))
            .collect();
        self.procedural_modifier.apply(&mut pose, now);
        pose
    }
}

/// Name -> clip lookup, replaceable wholesale at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipTable {
    #[serde(default)]
    pub clips: HashMap<String, GestureClip>,
}

impl ClipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a clip under its own name. Last write wins on duplicates.
    pub fn add(&mut self, clip: GestureClip) {
        self.clips.insert(clip.name.clone(), clip);
    }

    pub fn get(&self, name: &str) -> Option<&GestureClip> {
        self.clips.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Load a clip table from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OdoriError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ClipError::ReadFile(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse a clip table from a TOML string. Clip names left empty in the
    /// file are backfilled from their table key.
    pub fn from_toml_str(s: &str) -> Result<Self, OdoriError> {
        let mut table: ClipTable =
            toml::from_str(s).map_err(|e| ClipError::Parse(e.to_string()))?;
        for (key, clip) in table.clips.iter_mut() {
            if clip.name.is_empty() {
                clip.name = key.clone();
            }
        }
        Ok(table)
    }
}
