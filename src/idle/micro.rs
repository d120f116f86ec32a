//! Idle sway and head-drift micro-motions.
//!
//! Slow lateral weight shift on the hips plus low-amplitude sinusoids on
//! the head so an undriven avatar never looks frozen. The two head
//! frequencies are incommensurate, keeping the combined path from visibly
//! repeating.

use std::f32::consts::TAU;

use crate::config::{HeadDriftConfig, SwayConfig};
use crate::pose::{BoneRotation, Pose};

/// Spine carries half the hip sway.
const SPINE_SWAY_FACTOR: f32 = 0.5;

/// Lateral hip and spine sway at time `t`. Empty when disabled.
pub fn sway_sample(t: f32, config: &SwayConfig, multiplier: f32) -> Pose {
    let mut pose = Pose::new();
    if !config.enabled {
        return pose;
    }

    let angle = (t * config.speed * TAU).sin() * config.intensity * multiplier;
    pose.set("hips", BoneRotation::new(0.0, 0.0, angle));
    pose.set("spine", BoneRotation::new(0.0, 0.0, angle * SPINE_SWAY_FACTOR));
    pose
}

/// Slow head wander at time `t`. Empty when disabled.
pub fn head_drift_sample(t: f32, config: &HeadDriftConfig, multiplier: f32) -> Pose {
    let mut pose = Pose::new();
    if !config.enabled {
        return pose;
    }

    let pitch = (t * config.pitch_speed).sin() * config.pitch_amplitude * multiplier;
    let yaw = (t * config.yaw_speed).sin() * config.yaw_amplitude * multiplier;
    pose.set("head", BoneRotation::new(pitch, yaw, 0.0));
    pose
}
