//! Binary occupancy masks for pixel-accurate collision
//!
//! Each row is packed into 64-bit words (bit `i` of word `w` is column
//! `w * 64 + i`). Bits past the mask width are always zero, so overlap tests
//! can AND whole words.

use glam::IVec2;

use crate::config::WorldConfig;

/// Per-pixel opacity bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    /// Words per row
    stride: usize,
    bits: Vec<u64>,
}

impl Mask {
    /// Empty (fully transparent) mask
    pub fn new(width: u32, height: u32) -> Self {
        let stride = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height as usize],
        }
    }

    /// Build a mask from an occupancy predicate
    pub fn from_fn(width: u32, height: u32, mut occupied: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if occupied(x, y) {
                    mask.set(x, y);
                }
            }
        }
        mask
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.stride + x as usize / 64;
            self.bits[idx] |= 1u64 << (x % 64);
        }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.stride + x as usize / 64;
        self.bits[idx] & (1u64 << (x % 64)) != 0
    }

    /// Number of occupied pixels
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    /// Mirror top to bottom
    pub fn flipped_vertical(&self) -> Self {
        let mut flipped = Self::new(self.width, self.height);
        let h = self.height as usize;
        for y in 0..h {
            let src = &self.bits[y * self.stride..(y + 1) * self.stride];
            let dst_row = h - 1 - y;
            flipped.bits[dst_row * self.stride..(dst_row + 1) * self.stride].copy_from_slice(src);
        }
        flipped
    }

    /// 64 columns of row `y` starting at column `x` (may be negative or past the edge)
    fn window(&self, y: usize, x: i32) -> u64 {
        let row = &self.bits[y * self.stride..(y + 1) * self.stride];
        if x >= 0 {
            let word = (x / 64) as usize;
            let shift = (x % 64) as u32;
            let lo = row.get(word).copied().unwrap_or(0) >> shift;
            let hi = if shift == 0 {
                0
            } else {
                row.get(word + 1).copied().unwrap_or(0) << (64 - shift)
            };
            lo | hi
        } else {
            let neg = x.unsigned_abs();
            if neg >= 64 {
                0
            } else {
                row.first().copied().unwrap_or(0) << neg
            }
        }
    }

    /// First coordinate (in this mask's space) where both masks are occupied.
    ///
    /// `offset` is the position of `other`'s top-left corner relative to this
    /// mask's top-left corner.
    pub fn overlap(&self, other: &Mask, offset: IVec2) -> Option<IVec2> {
        let y_start = offset.y.max(0);
        let y_end = (offset.y + other.height as i32).min(self.height as i32);
        if y_start >= y_end
            || offset.x >= self.width as i32
            || offset.x + other.width as i32 <= 0
        {
            return None;
        }

        for y in y_start..y_end {
            let row = y as usize * self.stride;
            let other_y = (y - offset.y) as usize;
            for w in 0..self.stride {
                let ours = self.bits[row + w];
                if ours == 0 {
                    continue;
                }
                let theirs = other.window(other_y, w as i32 * 64 - offset.x);
                let hit = ours & theirs;
                if hit != 0 {
                    let x = w as i32 * 64 + hit.trailing_zeros() as i32;
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Whether the masks share any occupied pixel
    #[inline]
    pub fn overlaps(&self, other: &Mask, offset: IVec2) -> bool {
        self.overlap(other, offset).is_some()
    }
}

/// Entity flap animation frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum FlapFrame {
    /// Wing raised
    #[default]
    Up,
    /// Wing level (also the diving pose)
    Level,
    /// Wing lowered
    Down,
}

impl FlapFrame {
    pub const ALL: [FlapFrame; 3] = [FlapFrame::Up, FlapFrame::Level, FlapFrame::Down];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            FlapFrame::Up => 0,
            FlapFrame::Level => 1,
            FlapFrame::Down => 2,
        }
    }
}

/// All masks a session needs, generated once
#[derive(Debug, Clone)]
pub struct Silhouettes {
    entity: [Mask; 3],
    obstacle_top: Mask,
    obstacle_bottom: Mask,
}

impl Silhouettes {
    pub fn new(config: &WorldConfig) -> Self {
        let entity = FlapFrame::ALL.map(|f| entity_mask(config.entity_width, config.entity_height, f));
        let obstacle_bottom = obstacle_mask(config.obstacle_width, config.obstacle_height);
        let obstacle_top = obstacle_bottom.flipped_vertical();
        Self {
            entity,
            obstacle_top,
            obstacle_bottom,
        }
    }

    #[inline]
    pub fn entity(&self, frame: FlapFrame) -> &Mask {
        &self.entity[frame.index()]
    }

    #[inline]
    pub fn obstacle_top(&self) -> &Mask {
        &self.obstacle_top
    }

    #[inline]
    pub fn obstacle_bottom(&self) -> &Mask {
        &self.obstacle_bottom
    }
}

/// Elliptical body with a beak, plus a wing whose height depends on the frame
fn entity_mask(width: u32, height: u32, frame: FlapFrame) -> Mask {
    let w = width as f32;
    let h = height as f32;
    // Body occupies the left ~85% of the sprite, beak the rest
    let body_rx = w * 0.42;
    let body_ry = h * 0.36;
    let body_cx = body_rx + 0.5;
    let body_cy = h * 0.55;

    let beak_x0 = body_cx + body_rx * 0.7;
    let beak_y0 = body_cy - h * 0.08;
    let beak_y1 = body_cy + h * 0.12;

    let wing_rx = w * 0.22;
    let wing_ry = h * 0.16;
    let wing_cx = w * 0.28;
    let wing_cy = match frame {
        FlapFrame::Up => h * 0.2,
        FlapFrame::Level => h * 0.5,
        FlapFrame::Down => h * 0.8,
    };

    Mask::from_fn(width, height, |x, y| {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let in_ellipse = |cx: f32, cy: f32, rx: f32, ry: f32| {
            let dx = (px - cx) / rx;
            let dy = (py - cy) / ry;
            dx * dx + dy * dy <= 1.0
        };
        let body = in_ellipse(body_cx, body_cy, body_rx, body_ry);
        let beak = px >= beak_x0 && px < w && py >= beak_y0 && py <= beak_y1;
        let wing = in_ellipse(wing_cx, wing_cy, wing_rx, wing_ry);
        body || beak || wing
    })
}

/// Bottom obstacle piece: a lip at the top (gap side) wider than the shaft
fn obstacle_mask(width: u32, height: u32) -> Mask {
    let inset = (width / 13).max(1).min(width.saturating_sub(1) / 2);
    let lip_height = (height / 16).max(1);
    Mask::from_fn(width, height, |x, y| {
        y < lip_height || (x >= inset && x < width - inset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(w: u32, h: u32) -> Mask {
        Mask::from_fn(w, h, |_, _| true)
    }

    #[test]
    fn test_set_get_count() {
        let mut mask = Mask::new(70, 3);
        mask.set(0, 0);
        mask.set(65, 2);
        mask.set(99, 1); // out of range, ignored
        assert!(mask.get(0, 0));
        assert!(mask.get(65, 2));
        assert!(!mask.get(64, 2));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_overlap_offsets() {
        let a = block(10, 10);
        let b = block(5, 5);
        assert_eq!(a.overlap(&b, IVec2::new(0, 0)), Some(IVec2::new(0, 0)));
        assert_eq!(a.overlap(&b, IVec2::new(9, 9)), Some(IVec2::new(9, 9)));
        assert_eq!(a.overlap(&b, IVec2::new(-4, -4)), Some(IVec2::new(0, 0)));
        assert!(!a.overlaps(&b, IVec2::new(10, 0)));
        assert!(!a.overlaps(&b, IVec2::new(0, 10)));
        assert!(!a.overlaps(&b, IVec2::new(-5, 0)));
    }

    #[test]
    fn test_overlap_across_word_boundary() {
        let mut a = Mask::new(100, 1);
        a.set(70, 0);
        let mut b = Mask::new(3, 1);
        b.set(2, 0);
        assert_eq!(a.overlap(&b, IVec2::new(68, 0)), Some(IVec2::new(70, 0)));
        assert!(!a.overlaps(&b, IVec2::new(67, 0)));
    }

    #[test]
    fn test_transparent_pixels_do_not_collide() {
        // Two L-shapes whose bounding boxes overlap but pixels do not
        let a = Mask::from_fn(4, 4, |x, y| x == 0 || y == 3);
        let b = Mask::from_fn(4, 4, |x, y| x == 3 || y == 0);
        assert!(!a.overlaps(&b, IVec2::new(1, -1)));
        assert!(a.overlaps(&b, IVec2::new(-3, 0)));
    }

    #[test]
    fn test_flip_vertical() {
        let mask = Mask::from_fn(3, 4, |_, y| y == 0);
        let flipped = mask.flipped_vertical();
        assert!(flipped.get(1, 3));
        assert!(!flipped.get(1, 0));
        assert_eq!(flipped.flipped_vertical(), mask);
    }

    #[test]
    fn test_silhouettes_shapes() {
        let config = WorldConfig::default();
        let sil = Silhouettes::new(&config);
        for frame in FlapFrame::ALL {
            let mask = sil.entity(frame);
            assert_eq!((mask.width(), mask.height()), (34, 24));
            // Irregular: neither empty nor a full rectangle
            assert!(mask.count() > 0);
            assert!(mask.count() < 34 * 24);
            assert!(!mask.get(0, 0));
        }
        assert_ne!(sil.entity(FlapFrame::Up), sil.entity(FlapFrame::Down));

        let bottom = sil.obstacle_bottom();
        assert_eq!((bottom.width(), bottom.height()), (60, 400));
        // Lip spans the full width, shaft does not
        assert!(bottom.get(0, 0));
        assert!(!bottom.get(0, 399));
        assert!(bottom.get(30, 399));
        assert_eq!(sil.obstacle_top(), &bottom.flipped_vertical());
    }

    proptest! {
        #[test]
        fn prop_overlap_is_mutual(dx in -80i32..80, dy in -40i32..40) {
            let sil = Silhouettes::new(&WorldConfig::default());
            let a = sil.entity(FlapFrame::Down);
            let b = sil.obstacle_top();
            prop_assert_eq!(a.overlaps(b, IVec2::new(dx, dy)), b.overlaps(a, IVec2::new(-dx, -dy)));
        }

        #[test]
        fn prop_overlap_matches_pixel_scan(dx in -40i32..40, dy in -30i32..30) {
            let sil = Silhouettes::new(&WorldConfig::default());
            let a = sil.entity(FlapFrame::Up);
            let b = sil.entity(FlapFrame::Down);
            let mut expected = false;
            for y in 0..a.height() as i32 {
                for x in 0..a.width() as i32 {
                    let (ox, oy) = (x - dx, y - dy);
                    if ox >= 0 && oy >= 0 && a.get(x as u32, y as u32) && b.get(ox as u32, oy as u32) {
                        expected = true;
                    }
                }
            }
            prop_assert_eq!(a.overlaps(b, IVec2::new(dx, dy)), expected);
        }
    }
}
