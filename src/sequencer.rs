//! Gesture playback queue.
//!
//! Clips blend from the live pose to their resolved target pose, one at a
//! time in enqueue order. The queue auto-advances on completion; the only
//! cancellation is `clear`.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::clip::ClipTable;
use crate::math::{BlendController, Easing};
use crate::pose::{FrameTargets, Pose};

/// A queued clip with its playback duration already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureQueueEntry {
    pub name: String,
    pub resolved_duration: f32,
}

/// The currently playing clip.
#[derive(Debug, Clone)]
struct ActiveGesture {
    name: String,
    blend: BlendController,
    transition_speed: f32,
}

impl ActiveGesture {
    /// Blend progress saturates early when the clip asks for a faster
    /// transition; at speed 1.0 the blend spans the whole duration.
    fn current_pose(&self) -> Pose {
        let progress = (self.blend.progress() * self.transition_speed).min(1.0);
        self.blend.pose_at(progress)
    }
}

/// FIFO queue of named gesture clips.
#[derive(Debug)]
pub struct GestureSequencer {
    clips: ClipTable,
    queue: VecDeque<GestureQueueEntry>,
    active: Option<ActiveGesture>,
    default_duration: f32,
}

impl GestureSequencer {
    pub fn new(clips: ClipTable, default_duration: f32) -> Self {
        Self {
            clips,
            queue: VecDeque::new(),
            active: None,
            default_duration: default_duration.max(0.001),
        }
    }

    /// Replace the clip lookup wholesale. Queued entries keep their resolved
    /// durations; entries whose clip vanished are skipped when they come up.
    pub fn set_clip_table(&mut self, clips: ClipTable) {
        debug!("Clip table replaced ({} clips)", clips.len());
        self.clips = clips;
    }

    pub fn clip_table(&self) -> &ClipTable {
        &self.clips
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    /// Name of the playing clip, if any.
    pub fn current_gesture(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queue a clip by name. Unknown or disabled names log a warning and do
    /// nothing. Starts immediately when nothing is playing, capturing the
    /// from-pose out of `live`.
    pub fn enqueue(&mut self, name: &str, duration: Option<f32>, live: &Pose, now: f32) {
        let Some(clip) = self.clips.get(name) else {
            warn!("Unknown gesture clip: {}", name);
            return;
        };
        if !clip.enabled {
            warn!("Gesture clip disabled: {}", name);
            return;
        }

        let resolved_duration = clip
            .duration
            .or(duration)
            .unwrap_or(self.default_duration);
        self.queue.push_back(GestureQueueEntry {
            name: name.to_string(),
            resolved_duration,
        });
        debug!("Enqueued gesture {} ({:.2}s)", name, resolved_duration);

        if self.active.is_none() {
            self.dequeue_and_start(live, now);
        }
    }

    /// Drop everything: the pending queue and the active blend. Scheduled
    /// reaction steps are not affected.
    pub fn clear(&mut self) {
        if self.active.is_some() || !self.queue.is_empty() {
            debug!(
                "Clearing gesture queue ({} pending, active: {:?})",
                self.queue.len(),
                self.current_gesture()
            );
        }
        self.queue.clear();
        self.active = None;
    }

    /// Start the next playable queue entry. The from-pose captures the
    /// target's bones out of `live`; bones absent there start at zero.
    /// Entries whose clip vanished or was disabled after a table swap are
    /// skipped with a warning.
    fn dequeue_and_start(&mut self, live: &Pose, now: f32) {
        while let Some(entry) = self.queue.pop_front() {
            let Some(clip) = self.clips.get(&entry.name) else {
                warn!("Gesture clip removed while queued: {}", entry.name);
                continue;
            };
            if !clip.enabled {
                warn!("Gesture clip disabled while queued: {}", entry.name);
                continue;
            }

            // The modifier is evaluated at start time, never baked in at
            // enqueue time.
            let to_pose = clip.resolve_target_pose(now);
            let from_pose = live.capture(to_pose.bone_names());
            debug!("Starting gesture {} ({:.2}s)", entry.name, entry.resolved_duration);
            self.active = Some(ActiveGesture {
                name: entry.name,
                blend: BlendController::with_easing(
                    from_pose,
                    to_pose,
                    entry.resolved_duration,
                    Easing::EaseInOut,
                ),
                transition_speed: clip.transition_speed.max(f32::MIN_POSITIVE),
            });
            return;
        }
        self.active = None;
    }

    /// Advance the active blend and write its pose into `targets`
    /// unconditionally. On completion the next entry starts, capturing its
    /// from-pose from this frame's just-written values. No-op while idle.
    pub fn tick(&mut self, dt: f32, targets: &mut FrameTargets, live: &Pose, now: f32) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.blend.update(dt);
        let pose = active.current_pose();
        for (name, rotation) in pose.iter() {
            targets.set_bone(name, rotation);
        }

        if active.blend.is_complete() {
            debug!("Gesture complete: {}", active.name);
            // The next capture must see this frame's final values so a
            // chained clip stays continuous on shared bones.
            let mut live_now = live.clone();
            for (name, rotation) in pose.iter() {
                live_now.set(name, rotation);
            }
            self.dequeue_and_start(&live_now, now);
        }
    }
}
