//! Per-avatar animation session.
//!
//! Owns every producer plus the frame's shared targets and runs the
//! priority order each tick: gesture blends write unconditionally, fired
//! reaction holds fill unclaimed bones, held expressions land, the idle
//! layer fills what is left, and the walk layer writes its own bones plus
//! the smoothed vertical offset. One session per avatar; a session is not
//! meant to be ticked from two places.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::activity::ActivityState;
use crate::clip::ClipTable;
use crate::config::Config;
use crate::idle::IdleLayer;
use crate::pose::{FrameTargets, Pose};
use crate::reaction::{BoneHolds, ReactionScheduler, ReactionStep, ScheduledAction, StepAction};
use crate::sequencer::GestureSequencer;
use crate::walk::{self, BobSmoother};

/// The five VRM viseme channels, in vector order.
pub const VISEME_CHANNELS: [&str; 5] = ["aa", "ih", "ou", "ee", "oh"];

/// One avatar's animation state and per-frame compositor.
#[derive(Debug)]
pub struct AnimationSession {
    config: Config,
    clock: f32,
    targets: FrameTargets,
    live_pose: Pose,
    sequencer: GestureSequencer,
    scheduler: ReactionScheduler,
    holds: BoneHolds,
    idle: IdleLayer,
    bob: BobSmoother,
    held_expressions: HashMap<String, f32>,
    activity: ActivityState,
    host_active: bool,
    volume: f32,
    walk_speed: f32,
    strafing: bool,
}

impl AnimationSession {
    pub fn new(config: Config, clips: ClipTable) -> Self {
        Self::with_seed(config, clips, rand::random())
    }

    /// Deterministic construction for tests and replayable sessions.
    pub fn with_seed(config: Config, clips: ClipTable, seed: u64) -> Self {
        info!("Animation session created ({} clips, seed {})", clips.len(), seed);
        let sequencer = GestureSequencer::new(clips, config.gesture.default_duration);
        let idle = IdleLayer::with_seed(&config.idle, seed);
        Self {
            config,
            clock: 0.0,
            targets: FrameTargets::new(),
            live_pose: Pose::new(),
            sequencer,
            scheduler: ReactionScheduler::new(),
            holds: BoneHolds::new(),
            idle,
            bob: BobSmoother::new(),
            held_expressions: HashMap::new(),
            activity: ActivityState::Idle,
            host_active: true,
            volume: 0.0,
            walk_speed: 0.0,
            strafing: false,
        }
    }

    // ---- Host status ----

    pub fn set_activity(&mut self, activity: ActivityState) {
        if activity != self.activity {
            debug!("Activity: {} -> {}", self.activity, activity);
            self.activity = activity;
        }
    }

    pub fn activity(&self) -> ActivityState {
        self.activity
    }

    /// Host liveness gate for the idle gesture cycle.
    pub fn set_active(&mut self, active: bool) {
        self.host_active = active;
    }

    /// Measured voice volume in [0, 1]; loud frames suppress idle gestures.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_blink_allowed(&mut self, allowed: bool) {
        self.idle.set_blink_allowed(allowed);
    }

    pub fn set_walk_speed(&mut self, speed: f32) {
        self.walk_speed = speed.max(0.0);
    }

    pub fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    /// Force lateral leg swing even when the configured walk direction is
    /// forward or backward.
    pub fn set_strafing(&mut self, strafing: bool) {
        self.strafing = strafing;
    }

    // ---- Gestures and reactions ----

    /// Queue a gesture clip; unknown or disabled names warn and do nothing.
    pub fn enqueue_gesture(&mut self, name: &str, duration: Option<f32>) {
        self.sequencer.enqueue(name, duration, &self.live_pose, self.clock);
    }

    /// Cancel the gesture queue and the active blend. Scheduled reaction
    /// steps keep running; `clear_scheduled` cancels those.
    pub fn clear_queue(&mut self) {
        self.sequencer.clear();
    }

    /// Cancel pending reaction-step actions and active bone holds.
    pub fn clear_scheduled(&mut self) {
        self.scheduler.clear();
        self.holds.clear();
    }

    pub fn set_clip_table(&mut self, clips: ClipTable) {
        self.sequencer.set_clip_table(clips);
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn current_gesture(&self) -> Option<&str> {
        self.sequencer.current_gesture()
    }

    pub fn queued_gestures(&self) -> usize {
        self.sequencer.queue_len()
    }

    pub fn pending_reactions(&self) -> usize {
        self.scheduler.pending()
    }

    /// Schedule a reaction script's steps at their cumulative fire times.
    pub fn execute_reaction_steps(&mut self, steps: &[ReactionStep]) {
        self.scheduler.schedule(steps, self.clock);
    }

    // ---- Expression sink ----

    /// Drive an expression channel; the value sticks until overwritten or
    /// released.
    pub fn set_expression(&mut self, name: &str, weight: f32) {
        self.held_expressions
            .insert(name.to_string(), weight.clamp(0.0, 1.0));
    }

    /// Release a held expression channel back to the idle layer.
    pub fn clear_expression(&mut self, name: &str) {
        self.held_expressions.remove(name);
    }

    /// Per-frame viseme vector from the speech analyzer, mapped onto the
    /// aa/ih/ou/ee/oh channels.
    pub fn set_viseme_weights(&mut self, weights: [f32; 5]) {
        for (channel, weight) in VISEME_CHANNELS.iter().zip(weights) {
            self.set_expression(channel, weight);
        }
    }

    // ---- Live pose ----

    /// Last known applied rotation per bone; gesture blends depart from
    /// these values.
    pub fn live_pose(&self) -> &Pose {
        &self.live_pose
    }

    /// Overwrite the live pose wholesale, for hosts where the renderer owns
    /// ground truth.
    pub fn sync_live_pose(&mut self, pose: Pose) {
        self.live_pose = pose;
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    // ---- Frame tick ----

    /// Advance the session by `dt` seconds and rebuild the frame targets.
    pub fn tick(&mut self, dt: f32) -> &FrameTargets {
        let dt = dt.max(0.0);
        self.clock += dt;
        self.targets.clear();
        self.holds.prune(self.clock);

        // 1. fire deferred reaction actions
        for event in self.scheduler.take_due(self.clock) {
            self.fire(event);
        }

        // 2. gesture blend, unconditional writes
        self.sequencer
            .tick(dt, &mut self.targets, &self.live_pose, self.clock);

        // 3. fired reaction holds fill unclaimed bones
        self.holds.write_into(&mut self.targets);

        // 4. held expressions (visemes, reaction expressions)
        for (name, weight) in &self.held_expressions {
            self.targets.set_expression(name, *weight);
        }

        // 5. idle layer fills what is left
        let idle_gesture = self.idle.apply(
            &mut self.targets,
            self.clock,
            dt,
            &self.config.idle,
            self.activity,
            self.host_active,
            self.volume,
        );
        if let Some(name) = idle_gesture {
            if !self.sequencer.is_playing() {
                debug!("Idle gesture cycle: {}", name);
                self.sequencer
                    .enqueue(name, None, &self.live_pose, self.clock);
            }
        }

        // 6. walk layer on its own bones, plus the smoothed vertical offset
        let strafing = self.strafing || self.config.walk.direction.is_strafe();
        let (walk_pose, bob_target) =
            walk::sample(self.walk_speed, self.clock, &self.config.walk, strafing);
        for (name, rotation) in walk_pose.iter() {
            self.targets.set_bone_if_absent(name, rotation);
        }
        self.targets.vertical_offset =
            self.bob
                .advance(bob_target, self.config.walk.bob.smoothing, dt);

        // 7. refresh the live pose from this frame's writes
        for (name, rotation) in self.targets.bones() {
            self.live_pose.set(name, rotation);
        }

        &self.targets
    }

    /// Apply one fired reaction action.
    fn fire(&mut self, event: ScheduledAction) {
        match event.action {
            StepAction::Pose { bones } | StepAction::Hands { bones } | StepAction::Facial { bones } => {
                let pose = StepAction::degrees_to_pose(&bones);
                self.holds.insert(pose, event.fire_at + event.duration);
            }
            StepAction::Gesture { name } => {
                self.sequencer
                    .enqueue(&name, None, &self.live_pose, self.clock);
            }
            StepAction::Expression { name, weight } => {
                self.set_expression(&name, weight);
            }
            StepAction::Unknown => {
                debug!("Ignoring unrecognized reaction step");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::GestureClip;
    use crate::pose::BoneRotation;
    use std::collections::HashMap as StdHashMap;

    fn demo_table() -> ClipTable {
        let mut table = ClipTable::new();
        table.add(
            GestureClip::new("wave").with_bone("rightUpperArm", BoneRotation::new(0.0, 0.0, -2.0)),
        );
        table.add(GestureClip::new("bow").with_bone("spine", BoneRotation::new(0.9, 0.0, 0.0)));
        table.add(
            GestureClip::new("head_tilt").with_bone("head", BoneRotation::new(0.0, 0.0, 0.25)),
        );
        table
    }

    fn session() -> AnimationSession {
        AnimationSession::with_seed(Config::default(), demo_table(), 42)
    }

    #[test]
    fn test_idle_breathing_fills_spine_when_no_gesture() {
        let mut session = session();
        // one tick to the quarter-cycle peak of the default 0.8 cyc/s breath
        let targets = session.tick(0.3125);
        let spine = targets.bone("spine").unwrap().x;
        assert!((spine - 0.006).abs() < 1e-4, "expected 0.006, got {}", spine);
    }

    #[test]
    fn test_gesture_overrides_idle_on_shared_bones() {
        let mut session = session();
        session.enqueue_gesture("bow", Some(1.0));

        // drive to completion; spine must land on the gesture target, far
        // beyond anything breathing can produce
        let mut spine = 0.0;
        for _ in 0..4 {
            spine = session.tick(0.25).bone("spine").unwrap().x;
        }
        assert!((spine - 0.9).abs() < 1e-4, "got {}", spine);
    }

    #[test]
    fn test_wave_then_bow_scenario() {
        let mut session = session();
        session.enqueue_gesture("wave", Some(1.5));
        session.enqueue_gesture("bow", Some(1.0));
        assert_eq!(session.current_gesture(), Some("wave"));
        assert_eq!(session.queued_gestures(), 1);

        for _ in 0..6 {
            session.tick(0.25);
        }
        assert_eq!(session.current_gesture(), Some("bow"), "bow auto-starts at 1.5s");

        for _ in 0..4 {
            session.tick(0.25);
        }
        assert!(!session.is_playing(), "both gestures done at 2.5s");
    }

    #[test]
    fn test_live_pose_follows_targets() {
        let mut session = session();
        session.enqueue_gesture("bow", Some(1.0));
        session.tick(0.5);

        let target_spine = session.targets().bone("spine").unwrap();
        assert_eq!(session.live_pose().get("spine"), target_spine);
    }

    #[test]
    fn test_walk_defers_to_gesture_on_contested_arm() {
        let mut session = session();
        session.set_walk_speed(1.0);
        session.enqueue_gesture("wave", Some(2.0));

        // mid-gesture, mid-stride
        for _ in 0..5 {
            session.tick(0.25);
        }
        let targets = session.targets();
        let right = targets.bone("rightUpperArm").unwrap();
        // the gesture drives z toward -2.0; walk arm swing only touches x
        // with |x| <= 0.3, so a large |z| proves the gesture won the bone
        assert!(right.z < -1.0, "gesture should own the right arm, z = {}", right.z);
        // the uncontested left arm still swings
        assert!(targets.has_bone("leftUpperArm"));
        assert!(targets.has_bone("leftUpperLeg"));
    }

    #[test]
    fn test_walk_zero_speed_produces_nothing() {
        let mut session = session();
        for _ in 0..10 {
            let targets = session.tick(0.1);
            assert!(!targets.has_bone("leftUpperLeg"));
            assert_eq!(targets.vertical_offset, 0.0);
        }
    }

    #[test]
    fn test_walk_bob_ramps_up_smoothly() {
        let mut session = session();
        session.set_walk_speed(1.0);

        let mut peak = 0.0f32;
        for _ in 0..120 {
            let offset = session.tick(1.0 / 60.0).vertical_offset;
            assert!(offset >= 0.0);
            peak = peak.max(offset);
        }
        assert!(peak > 0.005, "bob never ramped up, peak {}", peak);
        assert!(
            peak <= session.config().walk.bob.intensity * 1.5 + 1e-4,
            "bob exceeded its cap: {}",
            peak
        );

        // stopping decays the offset instead of snapping
        session.set_walk_speed(0.0);
        let first = session.tick(1.0 / 60.0).vertical_offset;
        assert!(first > 0.0 || peak < 1e-3, "offset should decay, not snap");
    }

    #[test]
    fn test_strafing_input_switches_leg_swing_lateral() {
        let mut session = session();
        session.set_walk_speed(1.0);
        session.tick(0.25);
        assert_eq!(session.targets().bone("leftUpperLeg").unwrap().z, 0.0);

        session.set_strafing(true);
        // t = 0.75: phase 3pi/2, full lateral swing
        session.tick(0.5);
        let z = session.targets().bone("leftUpperLeg").unwrap().z;
        assert!(z.abs() > 0.1, "expected lateral swing while strafing, got {}", z);
    }

    #[test]
    fn test_viseme_weights_clamped_and_applied() {
        let mut session = session();
        session.set_viseme_weights([1.5, -0.2, 0.5, 0.0, 1.0]);
        let targets = session.tick(0.016);
        assert_eq!(targets.expression("aa"), Some(1.0));
        assert_eq!(targets.expression("ih"), Some(0.0));
        assert_eq!(targets.expression("ou"), Some(0.5));
        assert_eq!(targets.expression("ee"), Some(0.0));
        assert_eq!(targets.expression("oh"), Some(1.0));
    }

    #[test]
    fn test_reaction_script_runs_across_modalities() {
        let mut session = session();

        let mut lean = StdHashMap::new();
        lean.insert("spine".to_string(), [90.0, 0.0, 0.0]);
        let steps = vec![
            ReactionStep::new(StepAction::Expression {
                name: "aa".to_string(),
                weight: 0.8,
            })
            .with_delay(0.5),
            ReactionStep::new(StepAction::Gesture {
                name: "wave".to_string(),
            })
            .with_delay(0.5),
            ReactionStep::new(StepAction::Pose { bones: lean })
                .with_delay(0.5)
                .with_duration(1.0),
        ];
        session.execute_reaction_steps(&steps);
        assert_eq!(session.pending_reactions(), 3);

        // before the first fire time nothing has landed
        session.tick(0.25);
        assert_eq!(session.targets().expression("aa"), None);

        // t = 0.5: expression fires and sticks
        session.tick(0.25);
        assert_eq!(session.targets().expression("aa"), Some(0.8));

        // t = 1.0: gesture fires
        session.tick(0.25);
        session.tick(0.25);
        assert_eq!(session.current_gesture(), Some("wave"));

        // t = 1.5: the pose hold lands; 90 degrees is far outside idle range
        session.tick(0.25);
        session.tick(0.25);
        let spine = session.targets().bone("spine").unwrap().x;
        assert!(
            (spine - std::f32::consts::FRAC_PI_2).abs() < 1e-4,
            "hold should pin the spine, got {}",
            spine
        );

        // t = 2.25: still held (expires at 2.5)
        for _ in 0..3 {
            session.tick(0.25);
        }
        let spine = session.targets().bone("spine").unwrap().x;
        assert!((spine - std::f32::consts::FRAC_PI_2).abs() < 1e-4, "got {}", spine);

        // t = 2.75: hold expired, spine back to idle amplitudes
        for _ in 0..2 {
            session.tick(0.25);
        }
        let spine = session.targets().bone("spine").unwrap().x;
        assert!(spine.abs() < 0.1, "hold should have expired, got {}", spine);
    }

    #[test]
    fn test_clear_queue_leaves_scheduled_steps() {
        let mut session = session();
        session.execute_reaction_steps(&[ReactionStep::new(StepAction::Gesture {
            name: "wave".to_string(),
        })
        .with_delay(0.5)]);

        session.enqueue_gesture("bow", Some(1.0));
        session.clear_queue();
        assert!(!session.is_playing());
        assert_eq!(session.pending_reactions(), 1, "clear_queue must not cancel the scheduler");

        for _ in 0..3 {
            session.tick(0.25);
        }
        assert_eq!(session.current_gesture(), Some("wave"));
    }

    #[test]
    fn test_clear_scheduled_cancels_steps_and_holds() {
        let mut session = session();
        let mut bones = StdHashMap::new();
        bones.insert("spine".to_string(), [45.0, 0.0, 0.0]);
        session.execute_reaction_steps(&[
            ReactionStep::new(StepAction::Pose { bones }).with_duration(10.0),
        ]);

        session.tick(0.25);
        session.clear_scheduled();
        session.tick(0.25);
        let spine = session.targets().bone("spine").unwrap().x;
        assert!(spine.abs() < 0.1, "hold should be gone, got {}", spine);
    }

    #[test]
    fn test_idle_cycle_dispatches_gesture_when_listening() {
        let mut session = session();
        session.set_activity(ActivityState::Listening);
        session.set_volume(0.1);

        session.tick(0.1);
        assert_eq!(session.current_gesture(), Some("head_tilt"));
    }

    #[test]
    fn test_idle_cycle_suppressed_while_loud() {
        let mut session = session();
        session.set_activity(ActivityState::Listening);
        session.set_volume(0.8);

        for _ in 0..10 {
            session.tick(0.1);
        }
        assert!(!session.is_playing());
    }

    #[test]
    fn test_idle_cycle_does_not_interrupt_playback() {
        let mut session = session();
        session.set_activity(ActivityState::Listening);
        session.enqueue_gesture("bow", Some(5.0));

        for _ in 0..5 {
            session.tick(0.1);
        }
        assert_eq!(session.current_gesture(), Some("bow"), "cycle must wait its turn");
    }

    #[test]
    fn test_negative_dt_does_not_rewind() {
        let mut session = session();
        session.tick(0.5);
        let clock = session.clock();
        session.tick(-3.0);
        assert_eq!(session.clock(), clock);
    }

    #[test]
    fn test_expression_release_returns_channel_to_idle() {
        let mut session = session();
        session.set_expression("blink", 0.7);
        session.tick(0.016);
        assert_eq!(session.targets().expression("blink"), Some(0.7));

        session.clear_expression("blink");
        let blink = session.tick(0.016).expression("blink").unwrap();
        assert!(blink < 0.7, "idle layer should own blink again, got {}", blink);
    }

    #[test]
    fn test_sync_live_pose_feeds_next_blend() {
        let mut session = session();
        let mut live = Pose::new();
        live.set("spine", BoneRotation::new(0.4, 0.0, 0.0));
        session.sync_live_pose(live);

        session.enqueue_gesture("bow", Some(1.0));
        let spine = session.tick(0.0).bone("spine").unwrap().x;
        assert!((spine - 0.4).abs() < 1e-5, "blend should depart from synced pose, got {}", spine);
    }
}
