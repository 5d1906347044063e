//! Blurred foreground placement across shutter-engine and shutter-compose.

use shutter_compose::{composite, place_blurred};
use shutter_core::{CodeMethod, Image8, PixelLayout};
use shutter_engine::{apply_motion_blur, calculate_blur_offset, generate_code};

// ── Helpers ────────────────────────────────────────────────────

/// Intensity-weighted centroid of channel 0.
fn centroid(image: &Image8) -> (f64, f64) {
    let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
    for y in 0..image.height() {
        for x in 0..image.width() {
            let v = image.pixel(x, y)[0] as f64;
            sx += x as f64 * v;
            sy += y as f64 * v;
            total += v;
        }
    }
    (sx / total, sy / total)
}

fn scene() -> (Image8, Image8) {
    let background = Image8::filled(240, 140, PixelLayout::Rgb, 0);
    let object = Image8::filled(40, 10, PixelLayout::Rgba, 255);
    (background, object)
}

// ── Offset-corrected placement ─────────────────────────────────

#[test]
fn horizontal_correction_pulls_blur_toward_sharp_position() {
    let (background, object) = scene();
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let position = (100, 60);

    let sharp = composite(&background, &object, position.0, position.1).unwrap();
    let blurred = apply_motion_blur(&object, &code, 10, 0.0).unwrap();
    let offset = calculate_blur_offset(&code, 10, 0.0).unwrap();

    let corrected = place_blurred(&background, &blurred, position, offset).unwrap();
    let uncorrected = composite(&background, &blurred, position.0, position.1).unwrap();

    let (sharp_x, sharp_y) = centroid(&sharp);
    let (corrected_x, corrected_y) = centroid(&corrected);
    let (uncorrected_x, _) = centroid(&uncorrected);

    assert!((corrected_y - sharp_y).abs() < 1e-9);
    // Horizontal placement keeps the 5 px safety margin of the padding.
    assert!((corrected_x - (sharp_x + 5.0)).abs() < 1.0, "{corrected_x}");
    assert!((uncorrected_x - sharp_x).abs() > (corrected_x - sharp_x).abs());
}

#[test]
fn vertical_correction_restores_row_centroid() {
    let (background, object) = scene();
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let position = (100, 60);

    let sharp = composite(&background, &object, position.0, position.1).unwrap();
    let blurred = apply_motion_blur(&object, &code, 10, 90.0).unwrap();
    let offset = calculate_blur_offset(&code, 10, 90.0).unwrap();
    assert_eq!(offset.x, 0);

    let corrected = place_blurred(&background, &blurred, position, offset).unwrap();
    let (_, sharp_y) = centroid(&sharp);
    let (_, corrected_y) = centroid(&corrected);
    assert!((corrected_y - sharp_y).abs() < 1.0, "{corrected_y} vs {sharp_y}");
}

#[test]
fn blurred_composite_keeps_background_outside_blur() {
    let background = Image8::filled(240, 140, PixelLayout::Rgb, 200);
    let object = Image8::filled(40, 10, PixelLayout::Rgba, 255);
    let code = generate_code(52, CodeMethod::Box).unwrap();
    let blurred = apply_motion_blur(&object, &code, 10, 0.0).unwrap();
    let offset = calculate_blur_offset(&code, 10, 0.0).unwrap();
    let out = place_blurred(&background, &blurred, (100, 60), offset).unwrap();

    assert_eq!(out.pixel(10, 10), &[200, 200, 200]);
    assert_eq!(out.pixel(120, 30), &[200, 200, 200]);
    assert_eq!(out.pixel(120, 65), &[255, 255, 255]);
}
