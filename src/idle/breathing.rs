//! Breathing generator.
//!
//! A single sine on the spine and chest X axes. Pure function of time; the
//! spine carries a dampened share so the motion reads as a torso-wide
//! breath rather than a hinge at one joint.

use std::f32::consts::TAU;

use crate::config::BreathingConfig;
use crate::pose::{BoneRotation, Pose};

/// Dampening on the spine contribution.
const SPINE_FACTOR: f32 = 0.5;
/// Dampening on the chest contribution.
const CHEST_FACTOR: f32 = 0.8;

/// Breathing phase in [0, 2pi) at time `t`.
pub fn breath_phase(t: f32, speed: f32) -> f32 {
    (t.abs() * speed * TAU) % TAU
}

/// Spine and chest rotations at time `t`. Empty when disabled.
pub fn sample(t: f32, config: &BreathingConfig, multiplier: f32) -> Pose {
    let mut pose = Pose::new();
    if !config.enabled {
        return pose;
    }

    let v = breath_phase(t, config.speed).sin();
    let base = v * config.intensity * multiplier;
    pose.set(
        "spine",
        BoneRotation::new(base * config.spine_weight * SPINE_FACTOR, 0.0, 0.0),
    );
    pose.set(
        "chest",
        BoneRotation::new(base * config.chest_weight * CHEST_FACTOR, 0.0, 0.0),
    );
    pose
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_produces_nothing() {
        let config = BreathingConfig {
            enabled: false,
            ..BreathingConfig::default()
        };
        assert!(sample(1.7, &config, 1.0).is_empty());
    }

    #[test]
    fn test_neutral_at_cycle_start() {
        let config = BreathingConfig::default();
        let pose = sample(0.0, &config, 1.0);
        assert!(pose.get("spine").x.abs() < 1e-6);
        assert!(pose.get("chest").x.abs() < 1e-6);
    }

    #[test]
    fn test_quarter_cycle_peak() {
        // speed 0.8 means a 1.25s cycle; the quarter-cycle peak lands at
        // t = 0.3125 where sin(pi/2) = 1:
        //   spine.x = 1.0 * 0.02 * 1.0 * 0.6 * 0.5 = 0.006
        let config = BreathingConfig {
            enabled: true,
            speed: 0.8,
            intensity: 0.02,
            spine_weight: 0.6,
            chest_weight: 1.0,
        };
        let pose = sample(0.3125, &config, 1.0);
        let spine = pose.get("spine").x;
        assert!((spine - 0.006).abs() < 1e-4, "expected 0.006, got {}", spine);

        let chest = pose.get("chest").x;
        assert!((chest - 0.016).abs() < 1e-4, "expected 0.016, got {}", chest);
    }

    #[test]
    fn test_phase_wraps() {
        let phase = breath_phase(10.0, 0.8);
        assert!((0.0..TAU).contains(&phase), "phase out of range: {}", phase);
        // 10s at 0.8 cyc/s is exactly 8 full cycles
        assert!(phase.abs() < 1e-3 || (TAU - phase).abs() < 1e-3, "got {}", phase);
    }

    #[test]
    fn test_negative_time_mirrors_positive() {
        let config = BreathingConfig::default();
        let forward = sample(0.3125, &config, 1.0);
        let backward = sample(-0.3125, &config, 1.0);
        assert!((forward.get("spine").x - backward.get("spine").x).abs() < 1e-6);
    }

    #[test]
    fn test_multiplier_scales_amplitude() {
        let config = BreathingConfig::default();
        let full = sample(0.3125, &config, 1.0).get("spine").x;
        let half = sample(0.3125, &config, 0.5).get("spine").x;
        assert!((half - full * 0.5).abs() < 1e-6, "half {} vs full {}", half, full);
    }
}
