//! External controller capability: observe -> act
//!
//! The session neither knows nor cares whether a controller is a human input
//! adapter, a scripted policy, or a learned network. It hands over a three
//! value observation each tick and jumps when the answer exceeds the
//! configured threshold.

use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::WORLD_HEIGHT;

/// Maps pixel-scale observations into roughly [0, 1] before weighting
const PERCEPTRON_INPUT_SCALE: f32 = 1.0 / WORLD_HEIGHT;

/// A controller could not produce an answer this tick
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ControllerError {
    #[error("controller fault: {0}")]
    Fault(String),
}

/// Per-tick input to a controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Entity's vertical position
    pub y: f32,
    /// Distance to the upper edge of the reference gap
    pub gap_top_distance: f32,
    /// Distance to the lower edge of the reference gap
    pub gap_bottom_distance: f32,
}

impl Observation {
    pub fn new(y: f32, gap_top: f32, gap_bottom: f32) -> Self {
        Self {
            y,
            gap_top_distance: (y - gap_top).abs(),
            gap_bottom_distance: (y - gap_bottom).abs(),
        }
    }

    #[inline]
    pub fn as_array(&self) -> [f32; 3] {
        [self.y, self.gap_top_distance, self.gap_bottom_distance]
    }
}

/// Decision maker for one entity.
///
/// Must not block, sleep or do I/O: every live controller is called once per
/// tick on the simulation thread. A panic inside `activate` is caught by the
/// session and counted as a fault, like a returned error.
pub trait Controller {
    /// Scalar decision; values above the jump threshold mean "jump"
    fn activate(&mut self, observation: &Observation) -> Result<f32, ControllerError>;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn activate(&mut self, observation: &Observation) -> Result<f32, ControllerError> {
        (**self).activate(observation)
    }
}

/// Map a raw controller answer into [-1, 1]; non-finite answers become `None`
#[inline]
pub fn sanitize_output(raw: f32) -> Option<f32> {
    raw.is_finite().then(|| raw.clamp(-1.0, 1.0))
}

/// Never jumps
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl Controller for Idle {
    fn activate(&mut self, _observation: &Observation) -> Result<f32, ControllerError> {
        Ok(0.0)
    }
}

/// Scripted policy: jump whenever the entity is more than `offset` below the
/// middle of the gap.
///
/// Works from the two distances alone: inside or below the gap,
/// `(top - bottom) / 2` is the height below the gap middle; above the gap it
/// is `-gap / 2`.
#[derive(Debug, Clone, Copy)]
pub struct Hover {
    pub offset: f32,
}

impl Default for Hover {
    fn default() -> Self {
        Self { offset: 20.0 }
    }
}

impl Controller for Hover {
    fn activate(&mut self, observation: &Observation) -> Result<f32, ControllerError> {
        let below_middle = (observation.gap_top_distance - observation.gap_bottom_distance) / 2.0;
        Ok(if below_middle >= self.offset { 1.0 } else { 0.0 })
    }
}

/// Single-layer tanh network over the observation, scaled to world height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perceptron {
    pub weights: [f32; 3],
    pub bias: f32,
}

impl Perceptron {
    /// Weights and bias drawn uniformly from [-1, 1)
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            weights: [
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            ],
            bias: rng.random_range(-1.0..1.0),
        }
    }
}

impl Controller for Perceptron {
    fn activate(&mut self, observation: &Observation) -> Result<f32, ControllerError> {
        let inputs = observation.as_array().map(|v| v * PERCEPTRON_INPUT_SCALE);
        let sum: f32 = self
            .weights
            .iter()
            .zip(inputs.iter())
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        Ok(sum.tanh())
    }
}

/// Manual input adapter: a flap requested by the input source is consumed on
/// the next tick
#[derive(Debug, Clone, Default)]
pub struct QueuedFlap {
    queued: Rc<Cell<bool>>,
}

impl QueuedFlap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the input source (keyboard, touch, replay...)
    pub fn handle(&self) -> FlapHandle {
        FlapHandle {
            queued: Rc::clone(&self.queued),
        }
    }
}

/// Input-side half of a [`QueuedFlap`]
#[derive(Debug, Clone)]
pub struct FlapHandle {
    queued: Rc<Cell<bool>>,
}

impl FlapHandle {
    pub fn flap(&self) {
        self.queued.set(true);
    }
}

impl Controller for QueuedFlap {
    fn activate(&mut self, _observation: &Observation) -> Result<f32, ControllerError> {
        Ok(if self.queued.replace(false) { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_observation_distances() {
        let obs = Observation::new(250.0, 200.0, 320.0);
        assert_eq!(obs.as_array(), [250.0, 50.0, 70.0]);
        // Above the gap, distances are still positive
        let obs = Observation::new(150.0, 200.0, 320.0);
        assert_eq!(obs.as_array(), [150.0, 50.0, 170.0]);
    }

    #[test]
    fn test_sanitize_output() {
        assert_eq!(sanitize_output(0.7), Some(0.7));
        assert_eq!(sanitize_output(3.0), Some(1.0));
        assert_eq!(sanitize_output(-3.0), Some(-1.0));
        assert_eq!(sanitize_output(f32::NAN), None);
        assert_eq!(sanitize_output(f32::INFINITY), None);
    }

    #[test]
    fn test_hover_policy() {
        let mut hover = Hover { offset: 20.0 };
        // Gap 200..320, middle 260
        let jump = |h: &mut Hover, y: f32| h.activate(&Observation::new(y, 200.0, 320.0)).unwrap();
        assert_eq!(jump(&mut hover, 150.0), 0.0); // above the gap
        assert_eq!(jump(&mut hover, 270.0), 0.0); // 10 below middle
        assert_eq!(jump(&mut hover, 280.0), 1.0); // 20 below middle
        assert_eq!(jump(&mut hover, 400.0), 1.0); // below the gap
    }

    #[test]
    fn test_perceptron_is_bounded_and_seeded() {
        let mut a = Perceptron::random(&mut Pcg32::seed_from_u64(3));
        let b = Perceptron::random(&mut Pcg32::seed_from_u64(3));
        assert_eq!(a, b);
        let out = a.activate(&Observation::new(250.0, 200.0, 320.0)).unwrap();
        assert!((-1.0..=1.0).contains(&out));
    }

    #[test]
    fn test_perceptron_scales_inputs() {
        let mut p = Perceptron {
            weights: [1.0, 0.0, 0.0],
            bias: 0.0,
        };
        // y = 300 is half the world height
        let out = p.activate(&Observation::new(300.0, 200.0, 320.0)).unwrap();
        assert!((out - 0.5f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_random_population_disagrees() {
        let mut rng = Pcg32::seed_from_u64(17);
        let obs = Observation::new(250.0, 200.0, 320.0);
        let jumps = (0..50)
            .map(|_| Perceptron::random(&mut rng).activate(&obs).unwrap())
            .filter(|out| *out > 0.5)
            .count();
        assert!(jumps > 0 && jumps < 50);
    }

    #[test]
    fn test_queued_flap_consumed_once() {
        let mut ctrl = QueuedFlap::new();
        let handle = ctrl.handle();
        let obs = Observation::new(250.0, 200.0, 320.0);
        assert_eq!(ctrl.activate(&obs), Ok(0.0));
        handle.flap();
        assert_eq!(ctrl.activate(&obs), Ok(1.0));
        assert_eq!(ctrl.activate(&obs), Ok(0.0));
    }

    #[test]
    fn test_boxed_controller() {
        let mut boxed: Box<dyn Controller> = Box::new(Hover::default());
        assert_eq!(boxed.activate(&Observation::new(400.0, 200.0, 320.0)), Ok(1.0));
    }
}
