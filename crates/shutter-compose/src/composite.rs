//! Placing a foreground onto a background.

use shutter_core::{Image8, Result, ShutterError};
use shutter_engine::BlurOffset;
use tracing::debug;

/// Composite `foreground` onto a copy of `background` with its top-left
/// corner at `(x, y)`.
///
/// A 4-channel foreground is alpha-blended onto the first three background
/// channels as `bg·(1 − a) + fg·a`, truncated. Any other foreground is
/// copied and must match the background's channel count. Parts falling
/// outside the background are dropped, negative positions included.
pub fn composite(background: &Image8, foreground: &Image8, x: i64, y: i64) -> Result<Image8> {
    let blend = foreground.layout().has_alpha();
    if blend && background.channels() < 3 {
        return Err(ShutterError::DimensionMismatch {
            expected: "background with at least 3 channels".into(),
            actual: format!("{} channels", background.channels()),
        });
    }
    if !blend && foreground.channels() != background.channels() {
        return Err(ShutterError::DimensionMismatch {
            expected: format!("{} channels", background.channels()),
            actual: format!("{} channels", foreground.channels()),
        });
    }

    let mut result = background.clone();
    let (bw, bh) = (background.width() as i64, background.height() as i64);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + foreground.width() as i64).min(bw);
    let y1 = (y + foreground.height() as i64).min(bh);
    if x0 >= x1 || y0 >= y1 {
        debug!(x, y, "Foreground lies entirely outside the background");
        return Ok(result);
    }
    if x < 0 || y < 0 || x1 - x < foreground.width() as i64 || y1 - y < foreground.height() as i64 {
        debug!(x, y, "Foreground exceeds background, clipping");
    }

    for dy in y0..y1 {
        for dx in x0..x1 {
            let src = foreground.pixel((dx - x) as usize, (dy - y) as usize);
            let dst = result.pixel_mut(dx as usize, dy as usize);
            if blend {
                let a = src[3] as f64 / 255.0;
                for c in 0..3 {
                    dst[c] = (dst[c] as f64 * (1.0 - a) + src[c] as f64 * a) as u8;
                }
            } else {
                dst.copy_from_slice(src);
            }
        }
    }
    Ok(result)
}

/// Composite a blurred foreground so that it lines up with where the sharp
/// foreground would sit at `position`.
pub fn place_blurred(
    background: &Image8,
    blurred: &Image8,
    position: (i64, i64),
    offset: BlurOffset,
) -> Result<Image8> {
    let (x, y) = (position.0 - offset.x, position.1 - offset.y);
    debug!(?position, adjusted = ?(x, y), "Placing blurred foreground");
    composite(background, blurred, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutter_core::PixelLayout;

    #[test]
    fn opaque_rgba_replaces_pixels() {
        let bg = Image8::filled(10, 10, PixelLayout::Rgb, 200);
        let fg = Image8::filled(3, 2, PixelLayout::Rgba, 255);
        let out = composite(&bg, &fg, 4, 5).unwrap();
        assert_eq!(out.pixel(4, 5), &[255, 255, 255]);
        assert_eq!(out.pixel(6, 6), &[255, 255, 255]);
        assert_eq!(out.pixel(7, 5), &[200, 200, 200]);
        assert_eq!(out.pixel(4, 7), &[200, 200, 200]);
    }

    #[test]
    fn half_alpha_blends_and_truncates() {
        let bg = Image8::filled(2, 1, PixelLayout::Rgb, 100);
        let mut fg = Image8::new(1, 1, PixelLayout::Rgba);
        fg.pixel_mut(0, 0).copy_from_slice(&[201, 0, 50, 128]);
        let out = composite(&bg, &fg, 0, 0).unwrap();
        let a = 128.0 / 255.0;
        let expect = |f: f64| (100.0 * (1.0 - a) + f * a) as u8;
        assert_eq!(out.pixel(0, 0), &[expect(201.0), expect(0.0), expect(50.0)]);
        assert_eq!(out.pixel(1, 0), &[100, 100, 100]);
    }

    #[test]
    fn transparent_pixels_keep_background() {
        let bg = Image8::filled(4, 4, PixelLayout::Rgb, 42);
        let fg = Image8::new(4, 4, PixelLayout::Rgba);
        assert_eq!(composite(&bg, &fg, 0, 0).unwrap(), bg);
    }

    #[test]
    fn negative_and_overflowing_positions_clip() {
        let bg = Image8::filled(5, 5, PixelLayout::Gray, 0);
        let fg = Image8::filled(3, 3, PixelLayout::Gray, 9);
        let out = composite(&bg, &fg, -2, 3).unwrap();
        assert_eq!(out.pixel(0, 3), &[9]);
        assert_eq!(out.pixel(0, 4), &[9]);
        assert_eq!(out.pixel(1, 3), &[0]);
        assert_eq!(out.pixel(0, 2), &[0]);

        let outside = composite(&bg, &fg, 10, 10).unwrap();
        assert_eq!(outside, bg);
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let bg = Image8::filled(5, 5, PixelLayout::Rgb, 0);
        let fg = Image8::filled(3, 3, PixelLayout::Gray, 9);
        assert!(matches!(
            composite(&bg, &fg, 0, 0),
            Err(ShutterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn place_blurred_subtracts_offset() {
        let bg = Image8::filled(20, 20, PixelLayout::Gray, 0);
        let fg = Image8::filled(2, 2, PixelLayout::Gray, 7);
        let out = place_blurred(&bg, &fg, (10, 10), BlurOffset::new(4, 3)).unwrap();
        assert_eq!(out.pixel(6, 7), &[7]);
        assert_eq!(out.pixel(10, 10), &[0]);
    }
}
