//! Blink generator.
//!
//! Each randomized interval opens with a triangular blink: the lid closes
//! over `duration` seconds, opens over the next `duration`, then stays open
//! until the timer expires and the interval redraws.

use rand::Rng;

use crate::config::BlinkConfig;

/// Triangular blink intensity at `phase` seconds into the interval.
pub fn blink_value(phase: f32, duration: f32) -> f32 {
    if duration <= 0.0 || phase < 0.0 {
        return 0.0;
    }
    if phase < duration {
        phase / duration
    } else if phase < 2.0 * duration {
        2.0 - phase / duration
    } else {
        0.0
    }
}

/// Next inter-blink interval: base plus or minus base * variation, uniform.
pub fn draw_interval(config: &BlinkConfig, rng: &mut impl Rng) -> f32 {
    let spread = config.base_interval * config.variation;
    if spread <= 0.0 {
        return config.base_interval;
    }
    rng.gen_range(config.base_interval - spread..=config.base_interval + spread)
}

/// Timer state for the blink generator.
#[derive(Debug, Clone)]
pub struct BlinkState {
    timer: f32,
    next_blink_time: f32,
    allowed: bool,
}

impl BlinkState {
    pub fn new(config: &BlinkConfig, rng: &mut impl Rng) -> Self {
        Self {
            timer: 0.0,
            next_blink_time: draw_interval(config, rng),
            allowed: true,
        }
    }

    /// External gate; a host driving the eyes directly keeps them open.
    pub fn set_allowed(&mut self, allowed: bool) {
        self.allowed = allowed;
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Advance by `dt` and return the blink intensity in [0, 1].
    pub fn advance(&mut self, dt: f32, config: &BlinkConfig, rng: &mut impl Rng) -> f32 {
        if !config.enabled {
            return 0.0;
        }

        self.timer += dt.max(0.0);
        if self.timer >= self.next_blink_time {
            self.timer = 0.0;
            self.next_blink_time = draw_interval(config, rng);
        }

        if !self.allowed {
            return 0.0;
        }
        blink_value(self.timer, config.duration)
    }
}
