//! Obstacle pairs: a top and bottom piece around a randomly placed gap

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

/// Draw attempts before falling back to the middle of the anchor range
const MAX_DRAWS: u32 = 8;

/// A scrolling top/bottom obstacle pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Left edge
    pub x: f32,
    /// Lower edge of the top piece (upper edge of the gap)
    pub gap_anchor: f32,
    /// Where the top piece's sprite starts (`gap_anchor - piece height`)
    pub top: f32,
    /// Where the bottom piece's sprite starts (`gap_anchor + gap`)
    pub bottom: f32,
    /// Set once an entity has moved past the left edge
    pub passed: bool,
}

impl Obstacle {
    /// Obstacle with a known gap anchor
    pub fn with_anchor(id: u32, x: f32, gap_anchor: f32, config: &WorldConfig) -> Self {
        Self {
            id,
            x,
            gap_anchor,
            top: gap_anchor - config.obstacle_height as f32,
            bottom: gap_anchor + config.obstacle_gap,
            passed: false,
        }
    }

    /// Spawn at `x` with the gap anchor drawn from `[gap_anchor_min, gap_anchor_max)`
    pub fn spawn<R: Rng>(id: u32, x: f32, config: &WorldConfig, rng: &mut R) -> Self {
        for _ in 0..MAX_DRAWS {
            let anchor = rng.random_range(config.gap_anchor_min..config.gap_anchor_max) as f32;
            let obstacle = Self::with_anchor(id, x, anchor, config);
            if obstacle.is_well_formed(config) {
                return obstacle;
            }
            log::warn!("Obstacle {id}: rejected gap anchor {anchor}, redrawing");
        }
        let mid = (config.gap_anchor_min + config.gap_anchor_max) / 2;
        log::warn!("Obstacle {id}: no valid draw, using anchor {mid}");
        Self::with_anchor(id, x, mid as f32, config)
    }

    /// Top piece ends above the bottom piece
    pub fn is_well_formed(&self, config: &WorldConfig) -> bool {
        self.top + (config.obstacle_height as f32) < self.bottom
    }

    /// Scroll left by the obstacle velocity
    #[inline]
    pub fn advance(&mut self, config: &WorldConfig) {
        self.x -= config.obstacle_velocity;
    }

    /// Trailing edge is past the left world boundary
    #[inline]
    pub fn has_exited(&self, config: &WorldConfig) -> bool {
        self.x + (config.obstacle_width as f32) < 0.0
    }

    /// One-shot passage check: true only on the first call where `entity_x`
    /// is beyond the left edge
    pub fn check_passage(&mut self, entity_x: f32) -> bool {
        if !self.passed && self.x < entity_x {
            self.passed = true;
            return true;
        }
        false
    }

    /// Horizontal centre (guide line target)
    #[inline]
    pub fn center_x(&self, config: &WorldConfig) -> f32 {
        self.x + config.obstacle_width as f32 / 2.0
    }
}
