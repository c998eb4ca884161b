//! Pixel-accurate collision between entities and obstacle pairs
//!
//! Bounding boxes are far too generous for a narrow gap and a round sprite, so
//! every test is a mask overlap at the pieces' relative offsets.

use glam::IVec2;

use super::entity::Entity;
use super::mask::{Mask, Silhouettes};
use super::obstacle::Obstacle;

/// Which obstacle piece was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    Top,
    Bottom,
}

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResult {
    pub piece: Piece,
    /// First overlapping pixel, in entity sprite coordinates
    pub point: IVec2,
}

/// Offset of a piece's sprite relative to the entity's sprite
#[inline]
fn piece_offset(entity_x: f32, entity_row: i32, piece_x: f32, piece_y: f32) -> IVec2 {
    IVec2::new(
        (piece_x - entity_x).round_ties_even() as i32,
        piece_y.round_ties_even() as i32 - entity_row,
    )
}

/// Overlap test with explicit masks for the entity and both pieces.
///
/// `entity_pos` is the entity's (x, pixel row); `top_y` and `bottom_y` are the
/// sprite origins of the two pieces at horizontal position `obstacle_x`.
pub fn pair_overlap(
    entity_mask: &Mask,
    entity_pos: (f32, i32),
    obstacle_x: f32,
    top_mask: &Mask,
    top_y: f32,
    bottom_mask: &Mask,
    bottom_y: f32,
) -> Option<CollisionResult> {
    let (ex, erow) = entity_pos;
    let top_offset = piece_offset(ex, erow, obstacle_x, top_y);
    if let Some(point) = entity_mask.overlap(top_mask, top_offset) {
        return Some(CollisionResult {
            piece: Piece::Top,
            point,
        });
    }
    let bottom_offset = piece_offset(ex, erow, obstacle_x, bottom_y);
    entity_mask
        .overlap(bottom_mask, bottom_offset)
        .map(|point| CollisionResult {
            piece: Piece::Bottom,
            point,
        })
}

/// Check an entity's current frame against both pieces of an obstacle
pub fn entity_obstacle_collision(
    entity: &Entity,
    obstacle: &Obstacle,
    silhouettes: &Silhouettes,
) -> Option<CollisionResult> {
    pair_overlap(
        silhouettes.entity(entity.frame),
        (entity.x, entity.row()),
        obstacle.x,
        silhouettes.obstacle_top(),
        obstacle.top,
        silhouettes.obstacle_bottom(),
        obstacle.bottom,
    )
}

/// Convenience boolean form
#[inline]
pub fn collides(entity: &Entity, obstacle: &Obstacle, silhouettes: &Silhouettes) -> bool {
    entity_obstacle_collision(entity, obstacle, silhouettes).is_some()
}
