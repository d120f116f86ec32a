//! Walk cycle generator.
//!
//! Stateless phase-driven locomotion: opposite-phase leg swing with knee
//! bend and foot counter-rotation, optional counter-phased arm swing, and a
//! vertical bob whose applied offset is smoothed so starting and stopping
//! do not pop.

use std::f32::consts::{PI, TAU};

use crate::config::{ArmSwingStyle, BobStyle, LegStyle, WalkConfig};
use crate::pose::{BoneRotation, Pose};

/// Knee fold contribution from backward swing vs lift.
const KNEE_SWING_WEIGHT: f32 = 0.7;
const KNEE_LIFT_WEIGHT: f32 = 0.3;
/// Foot counter-rotation relative to its hip.
const FOOT_COUNTER_FACTOR: f32 = 0.5;

/// Stride phase in [0, 2pi); zero when not moving.
pub fn stride_phase(speed: f32, t: f32) -> f32 {
    if speed <= 0.0 {
        return 0.0;
    }
    (t * speed * TAU) % TAU
}

/// Hip, knee, and foot rotations for both legs. Empty when not moving.
pub fn leg_pose(speed: f32, t: f32, style: &LegStyle, strafing: bool) -> Pose {
    let mut pose = Pose::new();
    if speed <= 0.0 {
        return pose;
    }

    let phase = stride_phase(speed, t);
    set_leg(&mut pose, "left", phase, style, strafing);
    set_leg(&mut pose, "right", phase + PI, style, strafing);
    pose
}

fn set_leg(pose: &mut Pose, side: &str, phase: f32, style: &LegStyle, strafing: bool) {
    let swing = phase.sin();
    let hip = swing * style.stride_length;
    // The knee only folds while its leg travels backward or lifts, which
    // keeps the cycle asymmetric like a real stride.
    let lift = (phase + PI * 0.5).sin().max(0.0);
    let knee =
        ((-swing).max(0.0) * KNEE_SWING_WEIGHT + lift * KNEE_LIFT_WEIGHT) * style.bend_amount;
    let lateral = if strafing {
        swing * style.lateral_offset
    } else {
        0.0
    };

    pose.set(&format!("{side}UpperLeg"), BoneRotation::new(hip, 0.0, lateral));
    pose.set(&format!("{side}LowerLeg"), BoneRotation::new(knee, 0.0, 0.0));
    pose.set(
        &format!("{side}Foot"),
        BoneRotation::new(-hip * FOOT_COUNTER_FACTOR, 0.0, 0.0),
    );
}

/// Arm swing phase-locked opposite the legs. Empty when disabled or still.
pub fn arm_swing(speed: f32, t: f32, style: &ArmSwingStyle) -> Pose {
    let mut pose = Pose::new();
    if !style.enabled || speed <= 0.0 {
        return pose;
    }

    let phase = stride_phase(speed, t);
    // Left arm travels with the right leg and vice versa
    pose.set(
        "leftUpperArm",
        BoneRotation::new((phase + PI).sin() * style.intensity, 0.0, 0.0),
    );
    pose.set(
        "rightUpperArm",
        BoneRotation::new(phase.sin() * style.intensity, 0.0, 0.0),
    );
    pose
}

/// Raw vertical bob target before smoothing. Zero when not moving.
pub fn vertical_bob_target(speed: f32, t: f32, style: &BobStyle) -> f32 {
    if speed <= 0.0 {
        return 0.0;
    }

    let effective_frequency = style.frequency * speed;
    let bob = (effective_frequency * t * TAU).sin().abs();
    bob * style.intensity * (0.5 + 0.5 * speed).clamp(0.5, 1.5)
}

/// Full walk contribution for one frame: combined pose plus the raw bob
/// target. `strafing` switches the legs to lateral swing regardless of the
/// configured direction.
pub fn sample(speed: f32, t: f32, config: &WalkConfig, strafing: bool) -> (Pose, f32) {
    let mut pose = leg_pose(speed, t, &config.leg, strafing);
    pose.accumulate(&arm_swing(speed, t, &config.arm));
    (pose, vertical_bob_target(speed, t, &config.bob))
}

/// Exponential smoother carrying the applied bob offset across frames.
#[derive(Debug, Clone, Default)]
pub struct BobSmoother {
    current: f32,
}

impl BobSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Move toward `target` at rate `smoothing`; returns the new offset.
    pub fn advance(&mut self, target: f32, smoothing: f32, dt: f32) -> f32 {
        let t = 1.0 - (-smoothing * dt.max(0.0)).exp();
        self.current += (target - self.current) * t;
        self.current
    }

    pub fn reset(&mut self) {
        self.current = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_speed_is_neutral() {
        let style = LegStyle::default();
        for i in 0..50 {
            let t = i as f32 * 0.37;
            assert_eq!(stride_phase(0.0, t), 0.0);
            assert!(leg_pose(0.0, t, &style, false).is_empty());
            assert_eq!(vertical_bob_target(0.0, t, &BobStyle::default()), 0.0);
        }
        assert!(leg_pose(-1.0, 2.0, &style, false).is_empty(), "negative speed is still");
    }

    #[test]
    fn test_phase_wraps_into_range() {
        for i in 0..200 {
            let t = i as f32 * 0.173;
            let phase = stride_phase(1.3, t);
            assert!((0.0..TAU).contains(&phase), "phase at t={} out of range: {}", t, phase);
        }
    }

    #[test]
    fn test_hips_swing_in_opposite_phase() {
        let style = LegStyle::default();
        for i in 0..100 {
            let t = i as f32 * 0.05;
            let pose = leg_pose(1.0, t, &style, false);
            let sum = pose.get("leftUpperLeg").x + pose.get("rightUpperLeg").x;
            assert!(sum.abs() < 1e-5, "hip swings should cancel at t={}, sum {}", t, sum);
        }
    }

    #[test]
    fn test_leg_rotations_bounded() {
        let style = LegStyle::default();
        for i in 0..200 {
            let t = i as f32 * 0.05;
            let pose = leg_pose(1.0, t, &style, false);
            for side in ["left", "right"] {
                let hip = pose.get(&format!("{side}UpperLeg")).x;
                let knee = pose.get(&format!("{side}LowerLeg")).x;
                assert!(hip.abs() <= style.stride_length + 1e-6, "hip {}", hip);
                assert!(knee >= 0.0, "knee never hyperextends, got {}", knee);
                assert!(knee <= style.bend_amount + 1e-6, "knee {}", knee);
            }
        }
    }

    #[test]
    fn test_foot_counter_rotates() {
        let style = LegStyle::default();
        // quarter cycle: left hip at peak forward swing
        let pose = leg_pose(1.0, 0.25, &style, false);
        let hip = pose.get("leftUpperLeg").x;
        let foot = pose.get("leftFoot").x;
        assert!(hip > 0.4, "expected peak swing, got {}", hip);
        assert!((foot + hip * 0.5).abs() < 1e-5, "foot {} vs hip {}", foot, hip);
    }

    #[test]
    fn test_lateral_offset_only_while_strafing() {
        let style = LegStyle::default();
        let forward = leg_pose(1.0, 0.25, &style, false);
        assert_eq!(forward.get("leftUpperLeg").z, 0.0);

        let strafe = leg_pose(1.0, 0.25, &style, true);
        let z = strafe.get("leftUpperLeg").z;
        assert!(z.abs() > 1e-4, "strafing should add lateral offset, got {}", z);
        assert!(z.abs() <= style.lateral_offset + 1e-6);
    }

    #[test]
    fn test_arm_swing_opposes_legs() {
        let arm_style = ArmSwingStyle::default();
        let leg_style = LegStyle::default();
        // probe a phase where everything is nonzero
        let arms = arm_swing(1.0, 0.25, &arm_style);
        let legs = leg_pose(1.0, 0.25, &leg_style, false);

        let left_arm = arms.get("leftUpperArm").x;
        let right_leg = legs.get("rightUpperLeg").x;
        assert!(left_arm.abs() > 1e-4);
        assert_eq!(
            left_arm.signum(),
            right_leg.signum(),
            "left arm should travel with the right leg"
        );

        let right_arm = arms.get("rightUpperArm").x;
        assert!((left_arm + right_arm).abs() < 1e-5, "arms should oppose each other");
        assert!(left_arm.abs() <= arm_style.intensity + 1e-6);
    }

    #[test]
    fn test_arm_swing_disabled() {
        let style = ArmSwingStyle {
            enabled: false,
            intensity: 0.3,
        };
        assert!(arm_swing(1.0, 0.25, &style).is_empty());
    }

    #[test]
    fn test_bob_target_bounded_and_speed_scaled() {
        let style = BobStyle::default();
        for i in 0..200 {
            let t = i as f32 * 0.05;
            let bob = vertical_bob_target(1.0, t, &style);
            assert!(bob >= 0.0, "bob is an absolute offset, got {}", bob);
            assert!(bob <= style.intensity * 1.5 + 1e-6, "bob {}", bob);
        }

        // walking faster deepens the bob up to the 1.5x cap
        let slow = vertical_bob_target(0.5, 0.0625, &style);
        let fast = vertical_bob_target(2.0, 0.015625, &style);
        assert!(slow > 0.0 && fast > 0.0);
        assert!(fast > slow, "fast {} should exceed slow {}", fast, slow);
    }

    #[test]
    fn test_smoother_converges_and_resets() {
        let mut smoother = BobSmoother::new();
        let mut previous = 0.0f32;
        for _ in 0..200 {
            let value = smoother.advance(0.04, 6.0, 0.016);
            assert!(value >= previous, "approach should be monotonic");
            assert!(value <= 0.04 + 1e-6);
            previous = value;
        }
        assert!((smoother.current() - 0.04).abs() < 1e-3, "got {}", smoother.current());

        // stopping decays back toward zero without snapping
        let first = smoother.advance(0.0, 6.0, 0.016);
        assert!(first > 0.0 && first < 0.04);
        smoother.reset();
        assert_eq!(smoother.current(), 0.0);
    }

    #[test]
    fn test_sample_combines_legs_and_arms() {
        let config = WalkConfig::default();
        let (pose, bob) = sample(1.0, 0.25, &config, false);
        assert!(pose.contains("leftUpperLeg"));
        assert!(pose.contains("rightLowerLeg"));
        assert!(pose.contains("leftFoot"));
        assert!(pose.contains("leftUpperArm"));
        assert!(pose.contains("rightUpperArm"));
        assert!(bob >= 0.0);

        let (still, still_bob) = sample(0.0, 0.25, &config, false);
        assert!(still.is_empty());
        assert_eq!(still_bob, 0.0);
    }

    #[test]
    fn test_sample_strafing_flag_overrides_direction() {
        let config = WalkConfig::default();
        let (forward, _) = sample(1.0, 0.25, &config, false);
        assert_eq!(forward.get("leftUpperLeg").z, 0.0);

        let (strafe, _) = sample(1.0, 0.25, &config, true);
        assert!(strafe.get("leftUpperLeg").z.abs() > 1e-4);
    }
}
