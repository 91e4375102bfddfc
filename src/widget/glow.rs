//! Press glow: a linear fade from 1.0 to 0 driven by a fixed tick.

use std::time::{Duration, Instant};

pub const DEFAULT_STEP: f64 = 0.04;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(30);

const SNAP_EPSILON: f64 = 1e-9;
const CHANGE_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fade {
    Idle,
    Fading { next_tick: Instant },
}

#[derive(Clone, Debug)]
pub struct Glow {
    level: f64,
    fade: Fade,
    step: f64,
    interval: Duration,
}

impl Default for Glow {
    fn default() -> Self {
        Self::new(DEFAULT_STEP, DEFAULT_INTERVAL)
    }
}

impl Glow {
    pub fn new(step: f64, interval: Duration) -> Self {
        let mut glow = Self {
            level: 0.0,
            fade: Fade::Idle,
            step: DEFAULT_STEP,
            interval: DEFAULT_INTERVAL,
        };
        glow.set_timing(step, interval);
        glow
    }

    /// Step clamps to 0.001..=1, interval to at least 1 ms
    pub fn set_timing(&mut self, step: f64, interval: Duration) {
        self.step = if step.is_nan() { DEFAULT_STEP } else { step.clamp(0.001, 1.0) };
        self.interval = interval.max(Duration::from_millis(1));
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.fade, Fade::Fading { .. })
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Full brightness; (re)starts the fade
    pub fn trigger(&mut self, now: Instant) {
        self.level = 1.0;
        self.fade = Fade::Fading { next_tick: now + self.interval };
    }

    /// One decay tick. Returns true if the level changed.
    pub fn step(&mut self) -> bool {
        if !self.is_fading() {
            return false;
        }
        if self.level <= self.step + SNAP_EPSILON {
            self.level = 0.0;
            self.fade = Fade::Idle;
        } else {
            self.level -= self.step;
        }
        true
    }

    /// Run every tick that is due at `now`. Returns true if the level changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Fade::Fading { next_tick } = self.fade {
            if next_tick > now {
                break;
            }
            changed |= self.step();
            if let Fade::Fading { .. } = self.fade {
                self.fade = Fade::Fading { next_tick: next_tick + self.interval };
            }
        }
        changed
    }

    /// Set the level directly, clamped to 0..=1. Returns false for no-op changes.
    pub fn set_level(&mut self, level: f64) -> bool {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        if (level - self.level).abs() < CHANGE_EPSILON {
            return false;
        }
        self.level = level;
        true
    }

    /// Ticks needed to fade from full brightness to zero
    pub fn ticks_to_idle(&self) -> u32 {
        (1.0 / self.step - SNAP_EPSILON).ceil() as u32
    }
}
