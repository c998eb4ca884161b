//! Session state and core simulation types
//!
//! A `Session` owns everything one evaluation run touches: the live pilots
//! (entity + controller), the fitness ledger, obstacles, ground and score.
//! Nothing is global; a new run means a new `Session`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ground::Ground;
use super::mask::Silhouettes;
use super::obstacle::Obstacle;
use crate::config::{ConfigError, WorldConfig};
use crate::controller::Controller;

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// No live entities remain
    AllRetired,
    /// Score reached the configured cap
    ScoreCap,
    /// External quit signal
    Quit,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Active,
    Terminal(Termination),
}

/// Why a pilot left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetireCause {
    Collision,
    OutOfBounds,
}

/// Things that happened during the most recent tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    ObstacleSpawned { id: u32, x: f32 },
    ObstaclePassed { id: u32 },
    ObstacleRemoved { id: u32 },
    PilotRetired { pilot: usize, cause: RetireCause },
}

/// A live entity and the controller steering it
#[derive(Debug)]
pub struct Pilot<C> {
    /// Position of the controller in the constructor's list
    pub id: usize,
    pub entity: Entity,
    pub controller: C,
}

/// Fitness ledger entry for one controller (kept after retirement)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotOutcome {
    pub id: usize,
    pub fitness: f64,
    pub ticks_survived: u64,
    pub retired: Option<RetireCause>,
    /// The controller returned an error at least once
    pub faulted: bool,
}

impl PilotOutcome {
    fn new(id: usize) -> Self {
        Self {
            id,
            fitness: 0.0,
            ticks_survived: 0,
            retired: None,
            faulted: false,
        }
    }
}

/// Final result of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub score: u64,
    pub generation: u32,
    pub ticks: u64,
    pub termination: Option<Termination>,
    /// One per controller, in construction order
    pub outcomes: Vec<PilotOutcome>,
}

impl SessionReport {
    pub fn best_fitness(&self) -> Option<f64> {
        self.outcomes.iter().map(|o| o.fitness).reduce(f64::max)
    }

    pub fn mean_fitness(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        Some(self.outcomes.iter().map(|o| o.fitness).sum::<f64>() / self.outcomes.len() as f64)
    }
}

/// Per-tick input from outside the simulation
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Stop the session now
    pub quit: bool,
}

/// One evaluation run of a controller population
#[derive(Debug)]
pub struct Session<C> {
    pub config: WorldConfig,
    pub(crate) silhouettes: Silhouettes,
    pub(crate) rng: Pcg32,
    /// Trainer's generation counter (opaque to the simulation)
    pub generation: u32,
    /// Live pilots, in construction order
    pub pilots: Vec<Pilot<C>>,
    /// Ledger indexed by pilot id
    pub outcomes: Vec<PilotOutcome>,
    /// Obstacles in spawn order
    pub obstacles: Vec<Obstacle>,
    pub ground: Ground,
    pub score: u64,
    pub time_ticks: u64,
    pub phase: SessionPhase,
    pub(crate) events: Vec<SessionEvent>,
    next_obstacle_id: u32,
}

impl<C: Controller> Session<C> {
    /// Build a session with one entity per controller, all at the start position
    pub fn new(
        config: WorldConfig,
        controllers: impl IntoIterator<Item = C>,
        generation: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pilots: Vec<Pilot<C>> = controllers
            .into_iter()
            .enumerate()
            .map(|(id, controller)| Pilot {
                id,
                entity: Entity::spawn(&config),
                controller,
            })
            .collect();
        let outcomes = (0..pilots.len()).map(PilotOutcome::new).collect();
        let phase = if pilots.is_empty() {
            SessionPhase::Terminal(Termination::AllRetired)
        } else {
            SessionPhase::Active
        };

        let mut session = Self {
            silhouettes: Silhouettes::new(&config),
            rng: Pcg32::seed_from_u64(config.seed),
            ground: Ground::new(&config),
            config,
            generation,
            pilots,
            outcomes,
            obstacles: Vec::new(),
            score: 0,
            time_ticks: 0,
            phase,
            events: Vec::new(),
            next_obstacle_id: 1,
        };
        let spawn_x = session.config.spawn_x;
        session.spawn_obstacle(spawn_x);

        log::info!(
            "Session started: generation {}, {} pilots, seed {}",
            session.generation,
            session.pilots.len(),
            session.config.seed
        );
        Ok(session)
    }

    /// Add an obstacle at `x` with a freshly drawn gap
    pub fn spawn_obstacle(&mut self, x: f32) -> u32 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        let obstacle = Obstacle::spawn(id, x, &self.config, &mut self.rng);
        log::debug!("Obstacle {} spawned at x={} gap={}", id, x, obstacle.gap_anchor);
        self.obstacles.push(obstacle);
        self.events.push(SessionEvent::ObstacleSpawned { id, x });
        id
    }

    /// Number of live entities
    #[inline]
    pub fn alive(&self) -> usize {
        self.pilots.len()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Terminal(_))
    }

    /// Mask cache for this session
    #[inline]
    pub fn silhouettes(&self) -> &Silhouettes {
        &self.silhouettes
    }

    /// Events recorded by the most recent tick
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshot of score and the fitness ledger
    pub fn report(&self) -> SessionReport {
        SessionReport {
            score: self.score,
            generation: self.generation,
            ticks: self.time_ticks,
            termination: match self.phase {
                SessionPhase::Terminal(t) => Some(t),
                SessionPhase::Active => None,
            },
            outcomes: self.outcomes.clone(),
        }
    }
}
