//! Padding and shift policy shared by the forward blur and the offset
//! estimator.
//!
//! Both must agree on where every sub-exposure lands and how much margin the
//! blurred result keeps; this module is the single source of that geometry.

use glam::DVec2;

/// Extra pixels of padding beyond the blur extent on each moving axis.
pub const SAFETY_MARGIN: usize = 5;

/// `|sin θ|` below this counts as no vertical motion.
const VERTICAL_EPSILON: f64 = 1e-6;

/// `|cos θ|` above this counts as purely horizontal motion.
const HORIZONTAL_COSINE: f64 = 0.999;

/// Geometry of one (blur length, angle, code length) configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurGeometry {
    direction: DVec2,
    blur_length: usize,
    code_length: usize,
}

impl BlurGeometry {
    /// `angle_degrees` is measured from the +x axis toward +y (image rows
    /// grow downward, so 90° is downward motion).
    pub fn new(blur_length: usize, angle_degrees: f64, code_length: usize) -> Self {
        let (dy, dx) = angle_degrees.to_radians().sin_cos();
        Self {
            direction: DVec2::new(dx, dy),
            blur_length,
            code_length,
        }
    }

    /// Unit motion vector `(cos θ, sin θ)`.
    #[inline]
    pub fn direction(&self) -> DVec2 {
        self.direction
    }

    #[inline]
    pub fn blur_length(&self) -> usize {
        self.blur_length
    }

    pub fn has_vertical_motion(&self) -> bool {
        self.direction.y.abs() >= VERTICAL_EPSILON
    }

    pub fn is_horizontal(&self) -> bool {
        self.direction.x.abs() > HORIZONTAL_COSINE
    }

    /// Blur extent projected on each axis, `(|k·dx|, |k·dy|)`.
    fn extent(&self) -> DVec2 {
        (self.direction * self.blur_length as f64).abs()
    }

    /// Zero padding added on every side before shifting, `(pad_x, pad_y)`.
    pub fn padding(&self) -> (usize, usize) {
        let extent = self.extent();
        let pad_x = extent.x as usize + SAFETY_MARGIN;
        let pad_y = if self.has_vertical_motion() {
            extent.y as usize + SAFETY_MARGIN
        } else {
            0
        };
        (pad_x, pad_y)
    }

    /// Margin kept around the original footprint after blurring.
    ///
    /// The blurred object's full extent must stay visible, so the whole
    /// padding is retained.
    pub fn retained_margin(&self) -> (usize, usize) {
        let (pad_x, pad_y) = self.padding();
        let extent = self.extent();
        let keep_x = pad_x.min(extent.x as usize + SAFETY_MARGIN);
        let keep_y = pad_y.min(extent.y as usize + SAFETY_MARGIN);
        (keep_x, keep_y)
    }

    /// Position of slot `i` within the exposure, in `[0, 1]`.
    pub fn time_fraction(&self, i: usize) -> f64 {
        if self.code_length < 2 {
            return 0.0;
        }
        i as f64 / (self.code_length - 1) as f64
    }

    /// Distance travelled along the motion axis by slot `i`, truncated.
    pub fn shift_index(&self, i: usize) -> i64 {
        (self.time_fraction(i) * self.span()) as i64
    }

    /// Integer `(x, y)` translation applied to the copy for slot `i`.
    /// Each component truncates toward zero.
    pub fn shift(&self, i: usize) -> (i64, i64) {
        let t = self.time_fraction(i);
        let sx = (t * self.span() * self.direction.x) as i64;
        let sy = (t * self.span() * self.direction.y) as i64;
        (sx, sy)
    }

    /// Offset the crop in [`crate::blur::apply_motion_blur`] introduces
    /// relative to the unpadded image, per axis.
    ///
    /// Purely horizontal motion carries no safety margin in x.
    pub fn crop_compensation(&self) -> DVec2 {
        let extent = self.direction.abs() * self.blur_length as f64;
        let x = if self.is_horizontal() {
            extent.x
        } else {
            extent.x + SAFETY_MARGIN as f64
        };
        let y = if self.has_vertical_motion() {
            extent.y + SAFETY_MARGIN as f64
        } else {
            0.0
        };
        DVec2::new(x, y)
    }

    fn span(&self) -> f64 {
        self.blur_length.saturating_sub(1) as f64
    }
}
