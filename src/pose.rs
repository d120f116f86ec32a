//! Bone rotations, poses, and the per-frame shared target set.
//!
//! Poses are string-keyed maps of per-bone Euler targets using VRM humanoid
//! bone names ("spine", "head", "leftUpperArm", ...). A bone missing from a
//! pose always reads as zero rotation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rotation target for a single bone, in radians. Axes omitted in authored
/// files read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoneRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl BoneRotation {
    pub const ZERO: BoneRotation = BoneRotation {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build from authored degrees (reaction scripts are written in degrees).
    pub fn from_degrees(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: x.to_radians(),
            y: y.to_radians(),
            z: z.to_radians(),
        }
    }

    /// Componentwise scale, used for clip intensity.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A set of bone rotations keyed by bone name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose {
    bones: HashMap<String, BoneRotation>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation for `name`, zero when the bone is not present.
    pub fn get(&self, name: &str) -> BoneRotation {
        self.bones.get(name).copied().unwrap_or(BoneRotation::ZERO)
    }

    pub fn set(&mut self, name: &str, rotation: BoneRotation) {
        self.bones.insert(name.to_string(), rotation);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.bones.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BoneRotation)> {
        self.bones.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Snapshot of the named bones, zero-filling any that are absent.
    pub fn capture<'a, I>(&self, names: I) -> Pose
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = Pose::new();
        for name in names {
            out.set(name, self.get(name));
        }
        out
    }

    /// Add another pose componentwise; missing keys are created.
    pub fn accumulate(&mut self, other: &Pose) {
        for (name, rotation) in other.iter() {
            let mut current = self.get(name);
            current.x += rotation.x;
            current.y += rotation.y;
            current.z += rotation.z;
            self.set(name, current);
        }
    }
}

impl FromIterator<(String, BoneRotation)> for Pose {
    fn from_iter<T: IntoIterator<Item = (String, BoneRotation)>>(iter: T) -> Self {
        Self {
            bones: iter.into_iter().collect(),
        }
    }
}

/// Per-frame output of the compositor: bone targets, expression intensities,
/// and the walk layer's vertical root offset.
///
/// Rebuilt from scratch every frame. The `*_if_absent` writers implement the
/// fill-in rule for lower-priority producers.
#[derive(Debug, Clone, Default)]
pub struct FrameTargets {
    bones: HashMap<String, BoneRotation>,
    expressions: HashMap<String, f32>,
    /// Vertical root offset from the walk bob, in model units.
    pub vertical_offset: f32,
}

impl FrameTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all targets; called at the top of every frame.
    pub fn clear(&mut self) {
        self.bones.clear();
        self.expressions.clear();
        self.vertical_offset = 0.0;
    }

    pub fn set_bone(&mut self, name: &str, rotation: BoneRotation) {
        self.bones.insert(name.to_string(), rotation);
    }

    /// Write a bone target only when no producer has claimed it this frame.
    /// Returns whether the write happened.
    pub fn set_bone_if_absent(&mut self, name: &str, rotation: BoneRotation) -> bool {
        if self.bones.contains_key(name) {
            return false;
        }
        self.bones.insert(name.to_string(), rotation);
        true
    }

    pub fn bone(&self, name: &str) -> Option<BoneRotation> {
        self.bones.get(name).copied()
    }

    pub fn has_bone(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    pub fn bones(&self) -> impl Iterator<Item = (&str, BoneRotation)> {
        self.bones.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Expression intensities are clamped into [0, 1] on write.
    pub fn set_expression(&mut self, name: &str, value: f32) {
        self.expressions.insert(name.to_string(), value.clamp(0.0, 1.0));
    }

    pub fn set_expression_if_absent(&mut self, name: &str, value: f32) -> bool {
        if self.expressions.contains_key(name) {
            return false;
        }
        self.expressions.insert(name.to_string(), value.clamp(0.0, 1.0));
        true
    }

    pub fn expression(&self, name: &str) -> Option<f32> {
        self.expressions.get(name).copied()
    }

    pub fn has_expression(&self, name: &str) -> bool {
        self.expressions.contains_key(name)
    }

    pub fn expressions(&self) -> impl Iterator<Item = (&str, f32)> {
        self.expressions.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }
}
