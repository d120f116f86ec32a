//! Configuration parsing and management for the animation core

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::activity::ActivityState;
use crate::error::{ConfigError, OdoriError};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub idle: IdleConfig,
    pub walk: WalkConfig,
    pub gesture: GestureConfig,
    /// Named alternates for the idle layer, selectable per session
    pub idle_presets: HashMap<String, IdleConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle: IdleConfig::default(),
            walk: WalkConfig::default(),
            gesture: GestureConfig::default(),
            idle_presets: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OdoriError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, OdoriError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, OdoriError> {
        // Try config paths in order
        let paths = [
            PathBuf::from("odori.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("odori.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Idle parameters for a named preset, falling back to the base `[idle]`
    /// table when the name is unknown
    pub fn idle_preset(&self, name: &str) -> &IdleConfig {
        match self.idle_presets.get(name) {
            Some(preset) => preset,
            None => {
                tracing::warn!("Unknown idle preset '{}', using base idle config", name);
                &self.idle
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), OdoriError> {
        // Validate blink timing
        if self.idle.blinking.duration <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "idle.blinking.duration".to_string(),
                message: "Blink duration must be greater than 0".to_string(),
            }
            .into());
        }

        if self.idle.blinking.base_interval <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "idle.blinking.base_interval".to_string(),
                message: "Blink interval must be greater than 0".to_string(),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.idle.blinking.variation) {
            return Err(ConfigError::InvalidValue {
                field: "idle.blinking.variation".to_string(),
                message: "Variation must be between 0.0 and 1.0".to_string(),
            }
            .into());
        }

        // Validate saccade timing
        if self.idle.saccade.min_interval <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "idle.saccade.min_interval".to_string(),
                message: "Saccade interval must be greater than 0".to_string(),
            }
            .into());
        }

        if self.idle.saccade.max_interval < self.idle.saccade.min_interval {
            return Err(ConfigError::InvalidValue {
                field: "idle.saccade.max_interval".to_string(),
                message: "Max interval must not be below min interval".to_string(),
            }
            .into());
        }

        // Validate walk settings
        if self.walk.bob.smoothing <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "walk.bob.smoothing".to_string(),
                message: "Bob smoothing rate must be greater than 0".to_string(),
            }
            .into());
        }

        if self.walk.leg.stride_length < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "walk.leg.stride_length".to_string(),
                message: "Stride length must not be negative".to_string(),
            }
            .into());
        }

        // Validate gesture settings
        if self.gesture.default_duration <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "gesture.default_duration".to_string(),
                message: "Default duration must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Idle-layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub breathing: BreathingConfig,
    pub blinking: BlinkConfig,
    pub saccade: SaccadeConfig,
    pub sway: SwayConfig,
    pub head_drift: HeadDriftConfig,
    pub multipliers: ActivityMultipliers,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            breathing: BreathingConfig::default(),
            blinking: BlinkConfig::default(),
            saccade: SaccadeConfig::default(),
            sway: SwayConfig::default(),
            head_drift: HeadDriftConfig::default(),
            multipliers: ActivityMultipliers::default(),
        }
    }
}

/// Breathing generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingConfig {
    /// Enable the breathing generator
    pub enabled: bool,
    /// Breath rate in cycles per second
    pub speed: f32,
    /// Peak rotation in radians before per-bone weighting
    pub intensity: f32,
    /// Spine contribution weight
    pub spine_weight: f32,
    /// Chest contribution weight
    pub chest_weight: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 0.8,
            intensity: 0.02,
            spine_weight: 0.6,
            chest_weight: 1.0,
        }
    }
}

/// Blink generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Enable the blink generator
    pub enabled: bool,
    /// One-way blink time in seconds (close and open each take this long)
    pub duration: f32,
    /// Mean seconds between blinks
    pub base_interval: f32,
    /// Uniform jitter as a fraction of the base interval (0.0 - 1.0)
    pub variation: f32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: 0.12,
            base_interval: 4.0,
            variation: 0.2,
        }
    }
}

/// Saccade generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaccadeConfig {
    /// Enable the saccade generator
    pub enabled: bool,
    /// Peak offset magnitude per saccade
    pub amplitude: f32,
    /// Minimum seconds between saccades
    pub min_interval: f32,
    /// Maximum seconds between saccades
    pub max_interval: f32,
}

impl Default for SaccadeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amplitude: 2.0,
            min_interval: 0.8,
            max_interval: 4.0,
        }
    }
}

/// Hip sway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayConfig {
    /// Enable the sway generator
    pub enabled: bool,
    /// Sway rate in cycles per second
    pub speed: f32,
    /// Peak hip roll in radians
    pub intensity: f32,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 0.2,
            intensity: 0.006,
        }
    }
}

/// Head drift configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadDriftConfig {
    /// Enable the head drift generator
    pub enabled: bool,
    /// Pitch oscillation rate in radians per second
    pub pitch_speed: f32,
    /// Peak pitch drift in radians
    pub pitch_amplitude: f32,
    /// Yaw oscillation rate in radians per second
    pub yaw_speed: f32,
    /// Peak yaw drift in radians
    pub yaw_amplitude: f32,
}

impl Default for HeadDriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pitch_speed: 0.7,
            pitch_amplitude: 0.015,
            yaw_speed: 0.5,
            yaw_amplitude: 0.01,
        }
    }
}

/// Idle intensity multiplier per activity state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityMultipliers {
    pub idle: f32,
    pub talking: f32,
    pub listening: f32,
    pub thinking: f32,
}

impl Default for ActivityMultipliers {
    fn default() -> Self {
        Self {
            idle: 1.0,
            talking: 1.2,
            listening: 0.9,
            thinking: 0.85,
        }
    }
}

impl ActivityMultipliers {
    pub fn for_state(&self, state: ActivityState) -> f32 {
        match state {
            ActivityState::Idle => self.idle,
            ActivityState::Talking => self.talking,
            ActivityState::Listening => self.listening,
            ActivityState::Thinking => self.thinking,
        }
    }
}

/// Walk cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Travel direction; lateral stride offsets only apply while strafing
    pub direction: WalkDirection,
    pub leg: LegStyle,
    pub arm: ArmSwingStyle,
    pub bob: BobStyle,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            direction: WalkDirection::Forward,
            leg: LegStyle::default(),
            arm: ArmSwingStyle::default(),
            bob: BobStyle::default(),
        }
    }
}

/// Walk travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkDirection {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
}

impl WalkDirection {
    pub fn is_strafe(&self) -> bool {
        matches!(self, WalkDirection::StrafeLeft | WalkDirection::StrafeRight)
    }
}

impl Default for WalkDirection {
    fn default() -> Self {
        Self::Forward
    }
}

/// Leg swing styling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegStyle {
    /// Peak hip swing in radians
    pub stride_length: f32,
    /// Peak knee bend in radians
    pub bend_amount: f32,
    /// Peak lateral hip offset while strafing, in radians
    pub lateral_offset: f32,
}

impl Default for LegStyle {
    fn default() -> Self {
        Self {
            stride_length: 0.5,
            bend_amount: 0.7,
            lateral_offset: 0.15,
        }
    }
}

/// Arm swing styling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmSwingStyle {
    /// Enable arm swing while walking
    pub enabled: bool,
    /// Peak arm swing in radians
    pub intensity: f32,
}

impl Default for ArmSwingStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.3,
        }
    }
}

/// Vertical bob styling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BobStyle {
    /// Peak vertical offset in model units
    pub intensity: f32,
    /// Bob cycles per stride cycle
    pub frequency: f32,
    /// Exponential smoothing rate for start/stop transitions
    pub smoothing: f32,
}

impl Default for BobStyle {
    fn default() -> Self {
        Self {
            intensity: 0.04,
            frequency: 2.0,
            smoothing: 6.0,
        }
    }
}

/// Gesture sequencer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Fallback clip duration when neither clip nor caller supplies one
    pub default_duration: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            default_duration: 2.0,
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("odori");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/odori");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/odori");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("odori");
        }
    }

    PathBuf::from(".")
}
