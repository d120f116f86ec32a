//! Odori - Procedural Avatar Animation Core
//!
//! A real-time animation compositor for skeletal avatars that:
//! - Plays queued gesture clips with eased blends out of the live pose
//! - Schedules multi-step reaction scripts across modalities
//! - Layers always-running idle motion (breathing, blinking, saccades)
//! - Generates phase-driven walk cycles with a smoothed vertical bob
//! - Merges every producer into one set of per-frame bone and expression
//!   targets under a fixed priority order

pub mod activity;
pub mod clip;
pub mod config;
pub mod error;
pub mod idle;
pub mod math;
pub mod pose;
pub mod reaction;
pub mod sequencer;
pub mod session;
pub mod walk;

pub use activity::ActivityState;
pub use clip::{Axis, ClipTable, GestureClip, ProceduralModifier};
pub use config::Config;
pub use error::{OdoriError, Result};
pub use math::{blend_pose, lerp, BlendController, Easing};
pub use pose::{BoneRotation, FrameTargets, Pose};
pub use reaction::{ReactionStep, StepAction};
pub use sequencer::GestureSequencer;
pub use session::{AnimationSession, VISEME_CHANNELS};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
