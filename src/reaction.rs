//! Multi-step reaction scripts.
//!
//! A reaction fans one trigger out across several modalities: body pose,
//! hand pose, face pose, queued gestures, and expression channels. Steps
//! are scheduled onto an explicit event list with cumulative fire times and
//! drained by the session tick in deterministic order.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::pose::{BoneRotation, FrameTargets, Pose};

/// One modality-specific action inside a reaction script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepAction {
    /// Body pose targets, authored in degrees.
    Pose { bones: HashMap<String, [f32; 3]> },
    /// Hand and finger pose targets, authored in degrees.
    Hands { bones: HashMap<String, [f32; 3]> },
    /// Face bone targets, authored in degrees.
    Facial { bones: HashMap<String, [f32; 3]> },
    /// Queue a gesture clip by name.
    Gesture { name: String },
    /// Drive an expression channel directly.
    Expression { name: String, weight: f32 },
    /// Unrecognized step type; kept so the rest of the script still runs,
    /// ignored at fire time.
    Unknown,
}

impl StepAction {
    /// Convert an authored degree map into a radian pose.
    pub fn degrees_to_pose(bones: &HashMap<String, [f32; 3]>) -> Pose {
        let mut pose = Pose::new();
        for (name, [x, y, z]) in bones {
            pose.set(name, BoneRotation::from_degrees(*x, *y, *z));
        }
        pose
    }
}

/// One step of a reaction script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionStep {
    /// Seconds after the previous step's clock ends.
    pub delay: f32,
    /// Seconds the step's effect holds before the next step's clock starts.
    pub duration: f32,
    #[serde(flatten)]
    pub action: StepAction,
}

impl ReactionStep {
    pub fn new(action: StepAction) -> Self {
        Self {
            delay: 0.0,
            duration: 0.0,
            action,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }
}

/// Loose wire shape for a step; unknown types and missing payloads degrade
/// to `StepAction::Unknown` instead of failing the whole script.
#[derive(Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delay: f32,
    #[serde(default)]
    duration: f32,
    #[serde(default)]
    bones: Option<HashMap<String, [f32; 3]>>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    weight: Option<f32>,
}

impl<'de> Deserialize<'de> for ReactionStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStep::deserialize(deserializer)?;
        let action = match raw.kind.as_str() {
            "pose" => StepAction::Pose {
                bones: raw.bones.unwrap_or_default(),
            },
            "hands" => StepAction::Hands {
                bones: raw.bones.unwrap_or_default(),
            },
            "facial" => StepAction::Facial {
                bones: raw.bones.unwrap_or_default(),
            },
            "gesture" => match raw.name {
                Some(name) => StepAction::Gesture { name },
                None => {
                    warn!("Reaction gesture step missing a name, ignoring");
                    StepAction::Unknown
                }
            },
            "expression" => match raw.name {
                Some(name) => StepAction::Expression {
                    name,
                    weight: raw.weight.unwrap_or(1.0),
                },
                None => {
                    warn!("Reaction expression step missing a name, ignoring");
                    StepAction::Unknown
                }
            },
            other => {
                warn!("Unrecognized reaction step type: {}", other);
                StepAction::Unknown
            }
        };
        Ok(ReactionStep {
            delay: raw.delay,
            duration: raw.duration,
            action,
        })
    }
}

/// A step action waiting for its fire time.
#[derive(Debug, Clone)]
pub struct ScheduledAction {
    /// Absolute session time the action fires at.
    pub fire_at: f32,
    /// Hold duration carried from the step, used by pose-like actions.
    pub duration: f32,
    /// Tie-break so equal fire times run in schedule order.
    seq: u64,
    pub action: StepAction,
}

/// Sorted event list of deferred reaction-step actions.
///
/// The fire time of step `i` is the schedule time plus the sum of every
/// delay up to and including `i`, plus the durations of all earlier steps.
#[derive(Debug, Default)]
pub struct ReactionScheduler {
    events: Vec<ScheduledAction>,
    next_seq: u64,
}

impl ReactionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule every step of a script relative to `now`.
    pub fn schedule(&mut self, steps: &[ReactionStep], now: f32) {
        let mut at = now;
        for step in steps {
            at += step.delay.max(0.0);
            self.events.push(ScheduledAction {
                fire_at: at,
                duration: step.duration.max(0.0),
                seq: self.next_seq,
                action: step.action.clone(),
            });
            self.next_seq += 1;
            at += step.duration.max(0.0);
        }
        self.events
            .sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at).then(a.seq.cmp(&b.seq)));
        debug!("Scheduled {} reaction steps ({} pending)", steps.len(), self.events.len());
    }

    /// Remove and return every action due at or before `now`, in fire order.
    pub fn take_due(&mut self, now: f32) -> Vec<ScheduledAction> {
        let split = self.events.partition_point(|e| e.fire_at <= now);
        self.events.drain(..split).collect()
    }

    /// Cancel everything still pending.
    pub fn clear(&mut self) {
        if !self.events.is_empty() {
            debug!("Cancelling {} scheduled reaction steps", self.events.len());
        }
        self.events.clear();
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Fire time of the next pending action.
    pub fn next_fire_at(&self) -> Option<f32> {
        self.events.first().map(|e| e.fire_at)
    }
}

/// Active bone holds from fired pose-like reaction steps.
#[derive(Debug, Default)]
pub struct BoneHolds {
    holds: Vec<BoneHold>,
}

/// A fired pose, hands, or facial step holding its targets until expiry.
#[derive(Debug, Clone)]
pub struct BoneHold {
    pub pose: Pose,
    /// Session time the hold expires at.
    pub until: f32,
}

impl BoneHolds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hold expiring at `until`.
    pub fn insert(&mut self, pose: Pose, until: f32) {
        self.holds.push(BoneHold { pose, until });
    }

    /// Drop expired holds. Zero-duration holds survive the frame they fire
    /// on and get pruned the next.
    pub fn prune(&mut self, now: f32) {
        self.holds.retain(|h| h.until >= now);
    }

    /// Write active holds under the if-absent guard, newest first so later
    /// scripts win contested bones.
    pub fn write_into(&self, targets: &mut FrameTargets) {
        for hold in self.holds.iter().rev() {
            for (name, rotation) in hold.pose.iter() {
                targets.set_bone_if_absent(name, rotation);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.holds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    pub fn clear(&mut self) {
        self.holds.clear();
    }
}
