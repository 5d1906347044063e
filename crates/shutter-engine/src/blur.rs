//! Forward coded-exposure motion blur.
//!
//! The blurred image is the weighted sum of integer-shifted copies of the
//! input, one per open shutter slot. The input is zero-padded first so that
//! no shifted copy is clipped, and the padding is kept in the output so the
//! blurred object's extremities remain visible to the compositor.

use crate::code::{CodeGenerator, ExposureCode};
use crate::geometry::BlurGeometry;
use rayon::prelude::*;
use shutter_core::{BlurParams, Image8, Rect, Result, Sample, ShutterError};
use tracing::debug;

/// One shifted, weighted copy contributing to the blur.
#[derive(Debug, Clone, Copy)]
struct Tap {
    weight: f64,
    shift_x: i64,
    shift_y: i64,
}

/// Blur `image` along `angle_degrees` over `blur_length` pixels using
/// `code` as the shutter sequence.
///
/// The output is larger than the input by the retained margin on every side
/// (see [`BlurGeometry::retained_margin`]). Alpha, when present, is blurred
/// like any other channel and padded as fully transparent.
pub fn apply_motion_blur(
    image: &Image8,
    code: &ExposureCode,
    blur_length: usize,
    angle_degrees: f64,
) -> Result<Image8> {
    if blur_length == 0 {
        return Err(ShutterError::invalid("Blur length must be positive"));
    }
    let weights = code.weights()?;
    let geometry = BlurGeometry::new(blur_length, angle_degrees, code.len());
    let (pad_x, pad_y) = geometry.padding();
    let padded = image.zero_pad(pad_x, pad_y);

    // Closed slots contribute nothing.
    let taps: Vec<Tap> = weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w != 0.0)
        .map(|(i, w)| {
            let (shift_x, shift_y) = geometry.shift(i);
            Tap {
                weight: *w,
                shift_x,
                shift_y,
            }
        })
        .collect();

    debug!(
        taps = taps.len(),
        pad_x,
        pad_y,
        blur_length,
        angle = angle_degrees,
        "Applying coded motion blur"
    );

    let (width, height, channels) = (padded.width(), padded.height(), padded.channels());
    let stride = width * channels;
    let mut accum = vec![0.0f64; height * stride];

    accum
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for tap in &taps {
                let src_y = y as i64 - tap.shift_y;
                if src_y < 0 || src_y >= height as i64 {
                    continue;
                }
                let src = padded.row(src_y as usize);
                // Destination x receives source x − shift_x when that is in range.
                let x0 = tap.shift_x.max(0) as usize;
                let x1 = (width as i64 + tap.shift_x).clamp(0, width as i64) as usize;
                for x in x0..x1 {
                    let sx = (x as i64 - tap.shift_x) as usize;
                    let dst = &mut row[x * channels..(x + 1) * channels];
                    let px = &src[sx * channels..(sx + 1) * channels];
                    for (d, s) in dst.iter_mut().zip(px) {
                        *d += tap.weight * *s as f64;
                    }
                }
            }
        });

    let blurred = Image8::from_vec(
        width,
        height,
        padded.layout(),
        accum.into_iter().map(u8::from_f64).collect(),
    )?;

    let (keep_x, keep_y) = geometry.retained_margin();
    blurred.crop(Rect::new(
        pad_x - keep_x,
        pad_y - keep_y,
        image.width() + 2 * keep_x,
        image.height() + 2 * keep_y,
    ))
}

/// Blur with a code generated from `params`.
pub fn apply_motion_blur_with(image: &Image8, params: &BlurParams) -> Result<Image8> {
    let code = CodeGenerator::from_seed(params.seed).generate(params.code_length, params.code_method)?;
    apply_motion_blur(image, &code, params.blur_length, params.angle_degrees)
}
