//! Fixed-rate simulation tick
//!
//! One call advances a session by exactly one tick: controller decisions,
//! physics, scrolling, collisions, obstacle lifecycle, retirement and the
//! frame hand-off, in that order.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use glam::Vec2;

use super::collision::collides;
use super::state::{
    Pilot, RetireCause, Session, SessionEvent, SessionPhase, SessionReport, Termination,
    TickInput,
};
use crate::config::WorldConfig;
use crate::controller::{Controller, ControllerError, Observation, sanitize_output};
use crate::frame::{EntityView, Frame, FrameSink, GuideLine, ObstacleView};
use crate::sim::obstacle::Obstacle;

/// How `Session::run` paces ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// As fast as possible (training)
    #[default]
    Unpaced,
    /// Hold the configured tick rate (watching)
    Realtime,
}

/// Obstacle the lead entity should steer by: the first one, unless the lead
/// entity is already past its trailing edge and a second one exists
pub fn reference_index<C>(
    pilots: &[Pilot<C>],
    obstacles: &[Obstacle],
    config: &WorldConfig,
) -> Option<usize> {
    let lead = pilots.first()?;
    let first = obstacles.first()?;
    if obstacles.len() > 1 && lead.entity.x > first.x + config.obstacle_width as f32 {
        Some(1)
    } else {
        Some(0)
    }
}

/// Advance the session by one tick
pub fn tick<C: Controller>(
    session: &mut Session<C>,
    input: &TickInput,
    sink: &mut dyn FrameSink,
) -> SessionPhase {
    if session.is_terminal() {
        return session.phase;
    }
    session.events.clear();

    if input.quit {
        log::info!("Session quit at tick {}", session.time_ticks);
        session.phase = SessionPhase::Terminal(Termination::Quit);
        return session.phase;
    }

    session.time_ticks += 1;
    let config = &session.config;

    // Reference obstacle, tracked by id so removals later in the tick can't shift it
    let reference_id =
        reference_index(&session.pilots, &session.obstacles, config).map(|i| session.obstacles[i].id);

    // Physics, survival reward and controller decisions
    for pilot in &mut session.pilots {
        pilot.entity.advance(config);
        let outcome = &mut session.outcomes[pilot.id];
        outcome.fitness += config.survival_reward;
        outcome.ticks_survived += 1;

        let Some(reference) = reference_id.and_then(|id| session.obstacles.iter().find(|o| o.id == id))
        else {
            continue;
        };
        let observation = Observation::new(pilot.entity.y, reference.gap_anchor, reference.bottom);
        let decision = panic::catch_unwind(AssertUnwindSafe(|| pilot.controller.activate(&observation)))
            .unwrap_or_else(|_| Err(ControllerError::Fault("controller panicked".to_string())));
        match decision {
            Ok(raw) => match sanitize_output(raw) {
                Some(output) if output > config.jump_threshold => pilot.entity.apply_impulse(config),
                Some(_) => {}
                None => log::warn!("Pilot {}: non-finite output {raw}, treated as no jump", pilot.id),
            },
            Err(e) => {
                if !outcome.faulted {
                    log::warn!("Pilot {}: {e}; treated as no jump", pilot.id);
                }
                outcome.faulted = true;
            }
        }
    }

    session.ground.advance(config);

    // Collisions and passages; retirements are collected and applied after the scan
    let mut retired: Vec<(usize, RetireCause)> = Vec::new();
    let mut is_retired = vec![false; session.outcomes.len()];
    let mut passages = 0u32;
    for obstacle in &mut session.obstacles {
        for pilot in &session.pilots {
            if is_retired[pilot.id] {
                continue;
            }
            if collides(&pilot.entity, obstacle, &session.silhouettes) {
                session.outcomes[pilot.id].fitness -= config.collision_penalty;
                is_retired[pilot.id] = true;
                retired.push((pilot.id, RetireCause::Collision));
                continue;
            }
            if obstacle.check_passage(pilot.entity.x) {
                passages += 1;
                session.events.push(SessionEvent::ObstaclePassed { id: obstacle.id });
            }
        }
        obstacle.advance(config);
    }

    for _ in 0..passages {
        session.score += 1;
        log::debug!("Score {} at tick {}", session.score, session.time_ticks);
        let spawn_x = session.config.spawn_x;
        session.spawn_obstacle(spawn_x);
    }
    let config = &session.config;

    let events = &mut session.events;
    session.obstacles.retain(|o| {
        let exited = o.has_exited(config);
        if exited {
            log::debug!("Obstacle {} removed", o.id);
            events.push(SessionEvent::ObstacleRemoved { id: o.id });
        }
        !exited
    });

    // Out of bounds: on or below the ground line, or above the top edge
    for pilot in &session.pilots {
        if is_retired[pilot.id] {
            continue;
        }
        let height = session.silhouettes.entity(pilot.entity.frame).height() as f32;
        if pilot.entity.y + height >= config.ground_y || pilot.entity.y < 0.0 {
            is_retired[pilot.id] = true;
            retired.push((pilot.id, RetireCause::OutOfBounds));
        }
    }

    if !retired.is_empty() {
        for &(id, cause) in &retired {
            log::debug!("Pilot {id} retired ({cause:?}) at tick {}", session.time_ticks);
            session.outcomes[id].retired = Some(cause);
            session.events.push(SessionEvent::PilotRetired { pilot: id, cause });
        }
        session.pilots.retain(|p| !is_retired[p.id]);
    }

    let frame = build_frame(session, reference_id);
    sink.present(&frame);

    if session.pilots.is_empty() {
        session.phase = SessionPhase::Terminal(Termination::AllRetired);
    } else if session.score >= session.config.score_cap {
        session.phase = SessionPhase::Terminal(Termination::ScoreCap);
    }
    if let SessionPhase::Terminal(reason) = session.phase {
        log::info!(
            "Session ended ({reason:?}): generation {}, score {}, {} ticks",
            session.generation,
            session.score,
            session.time_ticks
        );
    }
    session.phase
}

/// Step animations and snapshot the world for the renderer
fn build_frame<C>(session: &mut Session<C>, reference_id: Option<u32>) -> Frame {
    let config = &session.config;
    let entities: Vec<EntityView> = session
        .pilots
        .iter_mut()
        .map(|pilot| {
            let (frame, tilt) = pilot.entity.current_silhouette(config);
            EntityView {
                pilot: pilot.id,
                x: pilot.entity.x,
                y: pilot.entity.y,
                tilt,
                frame,
            }
        })
        .collect();

    let reference = reference_id.and_then(|id| session.obstacles.iter().find(|o| o.id == id));
    let guide_lines = match reference {
        Some(obstacle) => {
            let half = Vec2::new(config.entity_width as f32, config.entity_height as f32) / 2.0;
            let target_x = obstacle.center_x(config);
            entities
                .iter()
                .flat_map(|e| {
                    let from = Vec2::new(e.x, e.y) + half;
                    [
                        GuideLine {
                            from,
                            to: Vec2::new(target_x, obstacle.gap_anchor),
                        },
                        GuideLine {
                            from,
                            to: Vec2::new(target_x, obstacle.bottom),
                        },
                    ]
                })
                .collect()
        }
        None => {
            if !entities.is_empty() {
                log::warn!("No reference obstacle at tick {}; guide lines skipped", session.time_ticks);
            }
            Vec::new()
        }
    };

    Frame {
        tick: session.time_ticks,
        obstacles: session
            .obstacles
            .iter()
            .map(|o| ObstacleView {
                id: o.id,
                x: o.x,
                gap_anchor: o.gap_anchor,
                top: o.top,
                bottom: o.bottom,
            })
            .collect(),
        ground: session.ground.offsets(),
        ground_y: session.ground.y,
        score: session.score,
        generation: session.generation.max(1) - 1,
        alive: entities.len(),
        entities,
        guide_lines,
    }
}

impl<C: Controller> Session<C> {
    /// Advance one tick
    pub fn tick(&mut self, input: &TickInput, sink: &mut dyn FrameSink) -> SessionPhase {
        tick(self, input, sink)
    }

    /// Tick until the session is terminal and return the final report.
    ///
    /// `input` is polled before every tick; a quit request ends the session
    /// without running that tick.
    pub fn run(
        &mut self,
        sink: &mut dyn FrameSink,
        mut input: impl FnMut(&Session<C>) -> TickInput,
        pacing: Pacing,
    ) -> SessionReport {
        let tick_duration = self.config.tick_duration();
        while !self.is_terminal() {
            let started = Instant::now();
            let tick_input = input(self);
            tick(self, &tick_input, sink);
            if pacing == Pacing::Realtime {
                if let Some(rest) = tick_duration.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }
        self.report()
    }
}
