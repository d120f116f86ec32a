//! Saccade generator.
//!
//! Rapid small gaze jumps: on a randomized countdown the offset leaps to a
//! fresh polar draw, then decays exponentially back toward center. The
//! offset maps onto the VRM look expressions behind a deadzone with
//! asymmetric horizontal/vertical caps.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::config::SaccadeConfig;

/// Exponential return-to-center rate between saccades.
const DECAY_RATE: f32 = 2.0;
/// Offset magnitude at or below which the eyes stay centered.
const DEADZONE: f32 = 0.5;
/// Cap on lookLeft/lookRight intensity.
const LOOK_CAP_HORIZONTAL: f32 = 0.3;
/// Cap on lookUp/lookDown intensity.
const LOOK_CAP_VERTICAL: f32 = 0.2;

/// Countdown and current gaze offset.
#[derive(Debug, Clone)]
pub struct SaccadeState {
    offset: Vec2,
    next_in: f32,
}

impl SaccadeState {
    pub fn new(config: &SaccadeConfig, rng: &mut impl Rng) -> Self {
        Self {
            offset: Vec2::ZERO,
            next_in: draw_next_interval(config, rng),
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Advance by `dt`: decay toward center, then fire a fresh jump when
    /// the countdown expires. Returns the current offset.
    pub fn advance(&mut self, dt: f32, config: &SaccadeConfig, rng: &mut impl Rng) -> Vec2 {
        if !config.enabled {
            self.offset = Vec2::ZERO;
            return self.offset;
        }

        let dt = dt.max(0.0);
        self.offset *= (-DECAY_RATE * dt).exp();
        self.next_in -= dt;
        if self.next_in <= 0.0 {
            let angle = rng.gen_range(0.0..TAU);
            let magnitude = rng.gen_range(0.0..=config.amplitude);
            self.offset = Vec2::new(angle.cos(), angle.sin()) * magnitude;
            self.next_in = draw_next_interval(config, rng);
        }
        self.offset
    }
}

/// Uniform inter-saccade interval in [min, max].
fn draw_next_interval(config: &SaccadeConfig, rng: &mut impl Rng) -> f32 {
    if config.max_interval <= config.min_interval {
        return config.min_interval;
    }
    rng.gen_range(config.min_interval..=config.max_interval)
}

/// Map a gaze offset onto the four VRM look channels.
///
/// Returns `(look_right, look_left, look_up, look_down)`, all zero inside
/// the deadzone.
pub fn look_weights(offset: Vec2) -> (f32, f32, f32, f32) {
    if offset.length() <= DEADZONE {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let right = offset.x.max(0.0).min(LOOK_CAP_HORIZONTAL);
    let left = (-offset.x).max(0.0).min(LOOK_CAP_HORIZONTAL);
    let up = offset.y.max(0.0).min(LOOK_CAP_VERTICAL);
    let down = (-offset.y).max(0.0).min(LOOK_CAP_VERTICAL);
    (right, left, up, down)
}
