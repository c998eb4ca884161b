//! World configuration
//!
//! Every tuning constant of the simulation, with defaults matching `consts`.
//! Persisted as JSON; missing fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Named world constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    pub tick_rate_hz: u32,

    // === Entity physics ===
    pub gravity: f32,
    pub jump_velocity: f32,
    pub terminal_displacement: f32,
    pub ascent_bias: f32,
    pub max_rotation: f32,
    pub min_rotation: f32,
    pub rotation_velocity: f32,
    pub dive_tilt: f32,
    pub tilt_hold_margin: f32,
    pub animation_time: u32,
    pub entity_start_x: f32,
    pub entity_start_y: f32,
    pub entity_width: u32,
    pub entity_height: u32,

    // === Obstacles ===
    pub obstacle_gap: f32,
    pub obstacle_velocity: f32,
    pub obstacle_width: u32,
    pub obstacle_height: u32,
    pub gap_anchor_min: i32,
    pub gap_anchor_max: i32,
    pub spawn_x: f32,

    // === Ground ===
    pub ground_y: f32,
    pub ground_width: f32,

    // === Scoring ===
    pub survival_reward: f64,
    pub collision_penalty: f64,
    pub jump_threshold: f32,
    pub score_cap: u64,

    /// Seed for obstacle placement
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            tick_rate_hz: TICK_RATE_HZ,

            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            terminal_displacement: TERMINAL_DISPLACEMENT,
            ascent_bias: ASCENT_BIAS,
            max_rotation: MAX_ROTATION,
            min_rotation: MIN_ROTATION,
            rotation_velocity: ROTATION_VELOCITY,
            dive_tilt: DIVE_TILT,
            tilt_hold_margin: TILT_HOLD_MARGIN,
            animation_time: ANIMATION_TIME,
            entity_start_x: ENTITY_START_X,
            entity_start_y: ENTITY_START_Y,
            entity_width: ENTITY_WIDTH,
            entity_height: ENTITY_HEIGHT,

            obstacle_gap: OBSTACLE_GAP,
            obstacle_velocity: OBSTACLE_VELOCITY,
            obstacle_width: OBSTACLE_WIDTH,
            obstacle_height: OBSTACLE_HEIGHT,
            gap_anchor_min: GAP_ANCHOR_MIN,
            gap_anchor_max: GAP_ANCHOR_MAX,
            spawn_x: SPAWN_X,

            ground_y: GROUND_Y,
            ground_width: GROUND_WIDTH,

            survival_reward: SURVIVAL_REWARD,
            collision_penalty: COLLISION_PENALTY,
            jump_threshold: JUMP_THRESHOLD,
            score_cap: SCORE_CAP,

            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Parse a config from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("World config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Same config with a different obstacle seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seconds per tick at the configured rate
    pub fn tick_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    /// Reject configurations the simulation cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        positive("gravity", self.gravity)?;
        positive("terminal_displacement", self.terminal_displacement)?;
        positive("rotation_velocity", self.rotation_velocity)?;
        positive("obstacle_gap", self.obstacle_gap)?;
        positive("obstacle_velocity", self.obstacle_velocity)?;
        positive("ground_y", self.ground_y)?;
        positive("ground_width", self.ground_width)?;

        let nonzero = [
            ("tick_rate_hz", self.tick_rate_hz),
            ("animation_time", self.animation_time),
            ("entity_width", self.entity_width),
            ("entity_height", self.entity_height),
            ("obstacle_width", self.obstacle_width),
            ("obstacle_height", self.obstacle_height),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be non-zero".to_string(),
                });
            }
        }

        if self.gap_anchor_min >= self.gap_anchor_max {
            return Err(ConfigError::Invalid {
                field: "gap_anchor_max",
                reason: format!(
                    "anchor range [{}, {}) is empty",
                    self.gap_anchor_min, self.gap_anchor_max
                ),
            });
        }
        if self.min_rotation > self.max_rotation {
            return Err(ConfigError::Invalid {
                field: "min_rotation",
                reason: "must not exceed max_rotation".to_string(),
            });
        }
        if self.score_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "score_cap",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
