use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Largest integration step; longer frames are subdivided so stiff springs stay stable.
const MAX_SUBSTEP_SECONDS: f32 = 1.0 / 240.0;
/// Longest frame simulated in one `step`; a stalled host resumes from here instead of catching up.
pub const MAX_FRAME_SECONDS: f32 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default = "default_rest_delta")]
    pub rest_delta: f32,
    #[serde(default = "default_rest_speed")]
    pub rest_speed: f32,
}

impl SpringConfig {
    pub const fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
            rest_delta: 0.001,
            rest_speed: 0.01,
        }
    }

    /// Generic scroll smoothing.
    pub const fn scroll() -> Self {
        Self::new(100.0, 30.0, 0.8)
    }

    /// Smoothing used by the full-page chain backdrop.
    pub const fn scroll_chain() -> Self {
        Self::new(100.0, 30.0, 0.5)
    }

    /// Fast follower that filters the raw velocity signal.
    pub const fn velocity() -> Self {
        Self::new(200.0, 50.0, 1.0)
    }

    /// Softer smoothing used by the bounded hero chains.
    pub const fn hero() -> Self {
        Self::new(80.0, 25.0, 1.0)
    }

    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    pub fn validate(&self, label: &str) -> Result<()> {
        for (field, value) in [
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("mass", self.mass),
            ("rest_delta", self.rest_delta),
            ("rest_speed", self.rest_speed),
        ] {
            if !value.is_finite() {
                bail!("{label}.{field} must be finite");
            }
        }
        if self.stiffness <= 0.0 {
            bail!("{label}.stiffness must be > 0, got {}", self.stiffness);
        }
        if self.mass <= 0.0 {
            bail!("{label}.mass must be > 0, got {}", self.mass);
        }
        if self.damping <= 0.0 {
            bail!("{label}.damping must be > 0, got {}", self.damping);
        }
        if self.rest_delta < 0.0 || self.rest_speed < 0.0 {
            bail!("{label} rest thresholds must be >= 0");
        }
        Ok(())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::scroll()
    }
}

fn default_mass() -> f32 {
    1.0
}

fn default_rest_delta() -> f32 {
    0.001
}

fn default_rest_speed() -> f32 {
    0.01
}

/// Second-order damped follower: `m·x'' = -k·(x - target) - c·x'`.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Moves to `value` immediately and discards momentum.
    pub fn jump(&mut self, value: f32) {
        if value.is_finite() {
            self.position = value;
            self.target = value;
            self.velocity = 0.0;
        }
    }

    pub fn is_at_rest(&self) -> bool {
        self.position == self.target && self.velocity == 0.0
    }

    /// Advances the simulation by `dt_seconds` and returns the new position.
    pub fn step(&mut self, dt_seconds: f32) -> f32 {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 || self.is_at_rest() {
            return self.position;
        }

        let dt_seconds = dt_seconds.min(MAX_FRAME_SECONDS);
        let substeps = (dt_seconds / MAX_SUBSTEP_SECONDS).ceil().max(1.0) as u32;
        let h = dt_seconds / substeps as f32;
        let SpringConfig {
            stiffness,
            damping,
            mass,
            rest_delta,
            rest_speed,
        } = self.config;

        for _ in 0..substeps {
            let displacement = self.position - self.target;
            let acceleration = (-stiffness * displacement - damping * self.velocity) / mass;
            // Semi-implicit Euler: velocity first, then position with the new velocity.
            self.velocity += acceleration * h;
            self.position += self.velocity * h;

            if (self.position - self.target).abs() < rest_delta && self.velocity.abs() < rest_speed
            {
                self.position = self.target;
                self.velocity = 0.0;
                break;
            }
        }

        self.position
    }
}
