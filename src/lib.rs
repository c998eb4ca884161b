//! Flappy Neuro - side-scrolling obstacle game driven by pluggable controllers
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacles, masks, collisions, session)
//! - `controller`: The observe -> act capability used by human input and learned policies
//! - `frame`: Per-tick snapshot handed to the rendering collaborator
//! - `config`: Named world constants with JSON load/save
//! - `stats`: Per-generation statistics and best-run ledger

pub mod config;
pub mod controller;
pub mod frame;
pub mod sim;
pub mod stats;

pub use config::{ConfigError, WorldConfig};
pub use controller::{Controller, ControllerError, Observation};
pub use frame::{Frame, FrameSink};
pub use sim::{Session, SessionReport};
pub use stats::{GenerationStats, StatsLog};

/// Default world constants
pub mod consts {
    /// Simulation tick rate (the game clock runs at 30 Hz)
    pub const TICK_RATE_HZ: u32 = 30;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 400.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Entity kinematics: d = v*t + 0.5*a*t^2
    pub const GRAVITY: f32 = 3.0;
    pub const JUMP_VELOCITY: f32 = -9.0;
    /// Displacement magnitude cap per tick
    pub const TERMINAL_DISPLACEMENT: f32 = 16.0;
    /// Extra upward push added whenever displacement is negative
    pub const ASCENT_BIAS: f32 = 2.0;

    /// Tilt (degrees)
    pub const MAX_ROTATION: f32 = 20.0;
    pub const MIN_ROTATION: f32 = -90.0;
    pub const ROTATION_VELOCITY: f32 = 10.0;
    /// At or below this tilt the entity stops flapping
    pub const DIVE_TILT: f32 = -80.0;
    /// Tilt stays up while the entity is less than this far below its jump baseline
    pub const TILT_HOLD_MARGIN: f32 = 50.0;
    /// Ticks per flap animation frame
    pub const ANIMATION_TIME: u32 = 5;

    /// Entity spawn point and sprite size
    pub const ENTITY_START_X: f32 = 150.0;
    pub const ENTITY_START_Y: f32 = 250.0;
    pub const ENTITY_WIDTH: u32 = 34;
    pub const ENTITY_HEIGHT: u32 = 24;

    /// Obstacles
    pub const OBSTACLE_GAP: f32 = 120.0;
    pub const OBSTACLE_VELOCITY: f32 = 5.0;
    pub const OBSTACLE_WIDTH: u32 = 60;
    pub const OBSTACLE_HEIGHT: u32 = 400;
    /// Gap anchor is drawn from [GAP_ANCHOR_MIN, GAP_ANCHOR_MAX)
    pub const GAP_ANCHOR_MIN: i32 = 100;
    pub const GAP_ANCHOR_MAX: i32 = 300;
    pub const SPAWN_X: f32 = 400.0;

    /// Ground band
    pub const GROUND_Y: f32 = 530.0;
    pub const GROUND_WIDTH: f32 = 400.0;

    /// Fitness shaping
    pub const SURVIVAL_REWARD: f64 = 0.1;
    pub const COLLISION_PENALTY: f64 = 1.0;
    /// Controller output above this means "jump"
    pub const JUMP_THRESHOLD: f32 = 0.5;

    /// Session ends once this many obstacles are passed
    pub const SCORE_CAP: u64 = 50;
}
