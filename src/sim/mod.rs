//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick only
//! - Seeded RNG only
//! - Stable iteration order (pilots and obstacles keep insertion order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod ground;
pub mod mask;
pub mod obstacle;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, Piece, collides, entity_obstacle_collision};
pub use entity::{Entity, displacement};
pub use ground::Ground;
pub use mask::{FlapFrame, Mask, Silhouettes};
pub use obstacle::Obstacle;
pub use state::{
    Pilot, PilotOutcome, RetireCause, Session, SessionEvent, SessionPhase, SessionReport,
    Termination, TickInput,
};
pub use tick::{Pacing, reference_index, tick};
