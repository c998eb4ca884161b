//! Scrolling ground band
//!
//! Two copies of the same strip laid end to end; whichever scrolls fully off
//! the left edge jumps behind the other.

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ground {
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
    pub width: f32,
}

impl Ground {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            y: config.ground_y,
            x1: 0.0,
            x2: config.ground_width,
            width: config.ground_width,
        }
    }

    /// Scroll by the shared obstacle velocity
    pub fn advance(&mut self, config: &WorldConfig) {
        self.x1 -= config.obstacle_velocity;
        self.x2 -= config.obstacle_velocity;

        if self.x1 + self.width < 0.0 {
            self.x1 = self.x2 + self.width;
        }
        if self.x2 + self.width < 0.0 {
            self.x2 = self.x1 + self.width;
        }
    }

    #[inline]
    pub fn offsets(&self) -> (f32, f32) {
        (self.x1, self.x2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wraparound() {
        let config = WorldConfig::default();
        let mut ground = Ground::new(&config);
        for _ in 0..81 {
            ground.advance(&config);
        }
        // x1 went past -400 and jumped behind x2
        assert_eq!(ground.offsets(), (395.0, -5.0));
    }

    proptest! {
        #[test]
        fn prop_strips_stay_one_width_apart(
            velocity in 1u32..40,
            width in 100u32..800,
            ticks in 0usize..2000,
        ) {
            let config = WorldConfig {
                obstacle_velocity: velocity as f32,
                ground_width: width as f32,
                ..Default::default()
            };
            let mut ground = Ground::new(&config);
            for _ in 0..ticks {
                ground.advance(&config);
                prop_assert_eq!((ground.x1 - ground.x2).abs(), width as f32);
                prop_assert!(ground.x1.min(ground.x2) >= -(width as f32) - velocity as f32);
            }
        }
    }
}
