//! Always-running idle motion generators.
//!
//! Each generator is a pure function of time and config plus a small piece
//! of timer/RNG state. This module owns that state and applies the combined
//! contribution to the frame targets under the if-absent write guard.

pub mod blink;
pub mod breathing;
pub mod gesture_cycle;
pub mod micro;
pub mod saccade;

pub use blink::{blink_value, BlinkState};
pub use gesture_cycle::GestureCycleState;
pub use saccade::{look_weights, SaccadeState};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activity::ActivityState;
use crate::config::IdleConfig;
use crate::pose::{FrameTargets, Pose};

/// State for the always-running idle generators.
#[derive(Debug)]
pub struct IdleLayer {
    blink: BlinkState,
    saccade: SaccadeState,
    cycle: GestureCycleState,
    rng: StdRng,
}

impl IdleLayer {
    pub fn new(config: &IdleConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Deterministic construction for tests and replayable sessions.
    pub fn with_seed(config: &IdleConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let blink = BlinkState::new(&config.blinking, &mut rng);
        let saccade = SaccadeState::new(&config.saccade, &mut rng);
        Self {
            blink,
            saccade,
            cycle: GestureCycleState::new(),
            rng,
        }
    }

    pub fn set_blink_allowed(&mut self, allowed: bool) {
        self.blink.set_allowed(allowed);
    }

    pub fn blink_allowed(&self) -> bool {
        self.blink.allowed()
    }

    /// Run every generator for this frame and write contributions into
    /// `targets` under the if-absent guard. Returns the gesture the idle
    /// cycle wants dispatched, if it selected a new one.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &mut self,
        targets: &mut FrameTargets,
        t: f32,
        dt: f32,
        config: &IdleConfig,
        activity: ActivityState,
        host_active: bool,
        volume: f32,
    ) -> Option<&'static str> {
        let multiplier = config.multipliers.for_state(activity);

        // Bone generators merge additively before the guarded write, so
        // breathing (spine.x) and sway (spine.z) can share a bone.
        let mut bones = Pose::new();
        bones.accumulate(&breathing::sample(t, &config.breathing, multiplier));
        bones.accumulate(&micro::sway_sample(t, &config.sway, multiplier));
        bones.accumulate(&micro::head_drift_sample(t, &config.head_drift, multiplier));
        for (name, rotation) in bones.iter() {
            targets.set_bone_if_absent(name, rotation);
        }

        let blink = self.blink.advance(dt, &config.blinking, &mut self.rng);
        targets.set_expression_if_absent("blink", blink);

        let offset = self.saccade.advance(dt, &config.saccade, &mut self.rng);
        let (right, left, up, down) = look_weights(offset);
        targets.set_expression_if_absent("lookRight", right);
        targets.set_expression_if_absent("lookLeft", left);
        targets.set_expression_if_absent("lookUp", up);
        targets.set_expression_if_absent("lookDown", down);

        self.cycle.advance(t, activity, host_active, volume)
    }
}
