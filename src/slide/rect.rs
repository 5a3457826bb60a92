//! Integer rectangles in level-0 slide space.

use serde::{Deserialize, Serialize};

/// A rectangle in level-0 pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SlideRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SlideRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// A rectangle with zero width or height covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether this rectangle lies fully inside `outer`.
    pub fn is_within(&self, outer: &SlideRect) -> bool {
        self.x >= outer.x
            && self.y >= outer.y
            && self.right() <= outer.right()
            && self.bottom() <= outer.bottom()
    }

    /// Intersect with `outer`, yielding an empty rectangle at the clamped
    /// origin when the two do not overlap.
    pub fn clamp_to(&self, outer: &SlideRect) -> SlideRect {
        let x = self.x.clamp(outer.x, outer.right().min(u32::MAX as u64) as u32);
        let y = self.y.clamp(outer.y, outer.bottom().min(u32::MAX as u64) as u32);
        let right = self.right().min(outer.right()).max(x as u64);
        let bottom = self.bottom().min(outer.bottom()).max(y as u64);
        SlideRect::new(x, y, (right - x as u64) as u32, (bottom - y as u64) as u32)
    }
}
