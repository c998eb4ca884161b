//! Player entity: vertical kinematics, tilt and flap animation

use serde::{Deserialize, Serialize};

use super::mask::FlapFrame;
use crate::config::WorldConfig;

/// The falling/jumping player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Horizontal position (fixed for the whole session)
    pub x: f32,
    /// Vertical position of the sprite's top edge (grows downward)
    pub y: f32,
    /// Velocity of the last impulse (0 before the first jump)
    pub vel: f32,
    /// Tilt in degrees, positive is nose up
    pub tilt: f32,
    /// Ticks since the last impulse
    pub tick_count: u32,
    /// Height recorded at the last impulse
    pub baseline: f32,
    /// Animation counter
    pub anim_count: u32,
    /// Current sprite frame
    pub frame: FlapFrame,
}

impl Entity {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            vel: 0.0,
            tilt: 0.0,
            tick_count: 0,
            baseline: y,
            anim_count: 0,
            frame: FlapFrame::Up,
        }
    }

    /// Spawn at the configured start position
    pub fn spawn(config: &WorldConfig) -> Self {
        Self::new(config.entity_start_x, config.entity_start_y)
    }

    /// Jump: restart the kinematic curve from the current height
    pub fn apply_impulse(&mut self, config: &WorldConfig) {
        self.vel = config.jump_velocity;
        self.tick_count = 0;
        self.baseline = self.y;
    }

    /// Advance one tick; returns the displacement applied
    pub fn advance(&mut self, config: &WorldConfig) -> f32 {
        self.tick_count += 1;
        let d = displacement(self.vel, self.tick_count, config);
        self.y += d;

        if d < 0.0 || self.y < self.baseline + config.tilt_hold_margin {
            if self.tilt < config.max_rotation {
                self.tilt = config.max_rotation;
            }
        } else if self.tilt > config.min_rotation {
            self.tilt = (self.tilt - config.rotation_velocity).max(config.min_rotation);
        }
        d
    }

    /// Step the flap animation and return the frame to draw/test with, plus tilt.
    ///
    /// Frames cycle Up, Level, Down, Level, Up over `4 * animation_time + 1`
    /// ticks. A nose-diving entity holds the Level frame.
    pub fn current_silhouette(&mut self, config: &WorldConfig) -> (FlapFrame, f32) {
        let t = config.animation_time;
        self.anim_count += 1;

        self.frame = if self.anim_count <= t {
            FlapFrame::Up
        } else if self.anim_count <= t * 2 {
            FlapFrame::Level
        } else if self.anim_count <= t * 3 {
            FlapFrame::Down
        } else if self.anim_count <= t * 4 {
            FlapFrame::Level
        } else {
            self.anim_count = 0;
            FlapFrame::Up
        };

        if self.tilt <= config.dive_tilt {
            self.frame = FlapFrame::Level;
            self.anim_count = t * 2;
        }

        (self.frame, self.tilt)
    }

    /// Pixel row of the sprite's top edge (half-way values round to even)
    #[inline]
    pub fn row(&self) -> i32 {
        self.y.round_ties_even() as i32
    }
}

/// Vertical displacement `t` ticks after an impulse of velocity `vel`.
///
/// Magnitude is capped at the terminal displacement, and upward moves get an
/// extra `ascent_bias` so climbs are snappier than falls.
pub fn displacement(vel: f32, t: u32, config: &WorldConfig) -> f32 {
    let t = t as f32;
    let mut d = vel * t + 0.5 * config.gravity * t * t;
    if d.abs() >= config.terminal_displacement {
        d = config.terminal_displacement.copysign(d);
    }
    if d < 0.0 {
        d -= config.ascent_bias;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displacement_table() {
        let config = WorldConfig::default();
        let expected = [0.0, -9.5, -14.0, -15.5, -14.0, -9.5, 0.0, 10.5, 16.0, 16.0, 16.0];
        for (t, want) in expected.iter().enumerate() {
            let d = displacement(-9.0, t as u32, &config);
            assert!((d - want).abs() < 1e-5, "t={t}: got {d}, want {want}");
        }
    }

    #[test]
    fn test_free_fall_from_rest() {
        let config = WorldConfig::default();
        let mut entity = Entity::new(150.0, 250.0);
        let steps: Vec<f32> = (0..5).map(|_| entity.advance(&config)).collect();
        assert_eq!(steps, vec![1.5, 6.0, 13.5, 16.0, 16.0]);
        assert!((entity.y - 303.0).abs() < 1e-4);
    }

    #[test]
    fn test_impulse_resets_curve() {
        let config = WorldConfig::default();
        let mut entity = Entity::new(150.0, 250.0);
        for _ in 0..8 {
            entity.advance(&config);
        }
        let y = entity.y;
        entity.apply_impulse(&config);
        assert_eq!(entity.tick_count, 0);
        assert_eq!(entity.baseline, y);
        assert_eq!(entity.vel, -9.0);

        let d = entity.advance(&config);
        assert!((d + 9.5).abs() < 1e-5);
        assert_eq!(entity.tilt, config.max_rotation);
    }

    #[test]
    fn test_tilt_range() {
        let config = WorldConfig::default();
        let mut entity = Entity::new(150.0, 0.0);
        let mut min_tilt = f32::MAX;
        for i in 0..200 {
            if i % 37 == 0 {
                entity.apply_impulse(&config);
            }
            entity.advance(&config);
            assert!(entity.tilt >= -90.0 && entity.tilt <= 20.0);
            min_tilt = min_tilt.min(entity.tilt);
        }
        assert_eq!(min_tilt, -90.0);
    }

    #[test]
    fn test_tilt_holds_near_baseline() {
        let config = WorldConfig::default();
        let mut entity = Entity::new(150.0, 250.0);
        // Falling but still within the hold margin: 251.5, 257.5, 271, 287
        for _ in 0..4 {
            entity.advance(&config);
            assert_eq!(entity.tilt, 20.0);
        }
        // 303 is past baseline + 50: nose starts dropping
        entity.advance(&config);
        assert_eq!(entity.tilt, 10.0);
    }

    #[test]
    fn test_flap_cycle() {
        let config = WorldConfig::default();
        let mut entity = Entity::new(150.0, 250.0);
        let frames: Vec<FlapFrame> = (0..22).map(|_| entity.current_silhouette(&config).0).collect();
        use FlapFrame::*;
        assert_eq!(&frames[0..5], &[Up; 5]);
        assert_eq!(&frames[5..10], &[Level; 5]);
        assert_eq!(&frames[10..15], &[Down; 5]);
        assert_eq!(&frames[15..20], &[Level; 5]);
        // Tick 21 closes the cycle, tick 22 starts the next one
        assert_eq!(frames[20], Up);
        assert_eq!(frames[21], Up);
        assert_eq!(entity.anim_count, 1);
    }

    #[test]
    fn test_dive_frame() {
        let config = WorldConfig::default();
        let mut entity = Entity::new(150.0, 250.0);
        entity.tilt = -80.0;
        for _ in 0..12 {
            let (frame, tilt) = entity.current_silhouette(&config);
            assert_eq!(frame, FlapFrame::Level);
            assert_eq!(tilt, -80.0);
        }
    }

    #[test]
    fn test_row_rounds_half_to_even() {
        let mut entity = Entity::new(150.0, 251.5);
        assert_eq!(entity.row(), 252);
        entity.y = 250.5;
        assert_eq!(entity.row(), 250);
    }
}
