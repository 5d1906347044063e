//! Center-of-mass displacement introduced by the forward blur.
//!
//! A blurred foreground is wider than the sharp one and its weight is not
//! centered on the original position. Subtracting this offset from the
//! placement position lines the blurred object up with where the sharp
//! object would sit.

use crate::code::ExposureCode;
use crate::geometry::BlurGeometry;
use serde::{Deserialize, Serialize};
use shutter_core::{Result, ShutterError};

/// Pixel displacement `(x, y)` of a blurred object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlurOffset {
    pub x: i64,
    pub y: i64,
}

impl BlurOffset {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Offset of the blur produced by [`crate::blur::apply_motion_blur`] with the
/// same code, length and angle.
///
/// Rounds half to even on both axes.
pub fn calculate_blur_offset(
    code: &ExposureCode,
    blur_length: usize,
    angle_degrees: f64,
) -> Result<BlurOffset> {
    if blur_length == 0 {
        return Err(ShutterError::invalid("Blur length must be positive"));
    }
    let weights = code.weights()?;
    let geometry = BlurGeometry::new(blur_length, angle_degrees, code.len());

    let center_of_mass: f64 = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w > 0.0)
        .map(|(i, w)| geometry.shift_index(i) as f64 * w)
        .sum();

    let crop = geometry.crop_compensation();
    let dir = geometry.direction();
    Ok(BlurOffset {
        x: ((center_of_mass + crop.x) * dir.x).round_ties_even() as i64,
        y: ((center_of_mass + crop.y) * dir.y).round_ties_even() as i64,
    })
}
