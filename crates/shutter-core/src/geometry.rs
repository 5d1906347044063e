//! Integer pixel rectangles.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from its top-left (inclusive) and bottom-right
    /// (exclusive) corners.
    pub fn from_corners(min: (usize, usize), max: (usize, usize)) -> Self {
        Self {
            x: min.0,
            y: min.1,
            width: max.0.saturating_sub(min.0),
            height: max.1.saturating_sub(min.1),
        }
    }

    /// Bounding box of a set of user-placed points.
    ///
    /// Coordinates are truncated to whole pixels and negative values are
    /// clamped to the image origin. Returns `None` for an empty set.
    pub fn bounding_box(points: &[[f64; 2]]) -> Option<Self> {
        let to_px = |v: f64| v.max(0.0) as usize;
        let xs = points.iter().map(|p| to_px(p[0]));
        let ys = points.iter().map(|p| to_px(p[1]));
        let min_x = xs.clone().min()?;
        let max_x = xs.max()?;
        let min_y = ys.clone().min()?;
        let max_y = ys.max()?;
        Some(Self::from_corners((min_x, min_y), (max_x, max_y)))
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(self) -> usize {
        self.y + self.height
    }

    /// Whether the rectangle lies inside an image of the given size.
    pub fn fits_within(self, width: usize, height: usize) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}
