//! Blur → deblur scenarios across shutter-core and shutter-engine.

use shutter_compose::psnr_samples;
use shutter_core::{BackgroundMode, CodeMethod, Image8, PixelLayout, ShutterError};
use shutter_engine::{
    apply_motion_blur, calculate_blur_offset, create_smearing_matrix, deblur_channel,
    deblur_with_background_estimation, generate_code, generate_code_named, DeblurOutput,
};

// ── Helpers ────────────────────────────────────────────────────

/// Gray image whose rows are 40 black, 200 at 100, 40 black.
fn flat_strip(height: usize) -> Image8 {
    let mut image = Image8::new(280, height, PixelLayout::Gray);
    for y in 0..height {
        image.row_mut(y)[40..240].fill(100);
    }
    image
}

// ── Forward blur ───────────────────────────────────────────────

#[test]
fn constant_image_keeps_brightness_under_blur() {
    let image = Image8::filled(300, 100, PixelLayout::Gray, 128);
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let blurred = apply_motion_blur(&image, &code, 20, 0.0).unwrap();

    let interior: Vec<u8> = (10..90)
        .flat_map(|y| (60..300).map(move |x| (x, y)))
        .map(|(x, y)| blurred.pixel(x, y)[0])
        .collect();
    assert!(interior.iter().all(|v| (127..=128).contains(v)));
}

#[test]
fn offsets_follow_motion_axis() {
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let horizontal = calculate_blur_offset(&code, 10, 0.0).unwrap();
    let vertical = calculate_blur_offset(&code, 10, 90.0).unwrap();
    assert_eq!(horizontal.y, 0);
    assert!(horizontal.x >= 0);
    assert_eq!(vertical.x, 0);
    assert!(vertical.y >= 0);
}

// ── Round trip ─────────────────────────────────────────────────

#[test]
fn coded_blur_round_trip_recovers_flat_region() {
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let k = 52;
    let sharp = flat_strip(3);
    let blurred = apply_motion_blur(&sharp, &code, k, 0.0).unwrap();
    let pad = k + 5;
    assert_eq!(blurred.width(), 280 + 2 * pad);

    let result = deblur_channel(&blurred.channel_plane(0), &code, k, 0.005).unwrap();
    assert_eq!(result.plane.width, blurred.width() - k + 1);
    assert_eq!(result.failed_rows(), 0);

    // Column j of the recovered plane is column j of the zero-padded input.
    let reference: Vec<f64> = sharp.row(0).iter().map(|v| *v as f64).collect();
    for y in 0..3 {
        let recovered = &result.plane.row(y)[pad..pad + 280];
        let quality = psnr_samples(&reference, recovered).unwrap();
        assert!(quality > 35.0, "row {y}: {quality:.2} dB");
    }
}

#[test]
fn deblurred_width_shrinks_by_blur_length() {
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let image = Image8::filled(150, 4, PixelLayout::Rgba, 90);
    for mode in [BackgroundMode::None, BackgroundMode::Constant] {
        let report = deblur_with_background_estimation(&image, &code, 30, mode, 0.005).unwrap();
        assert_eq!(report.output.width(), 150 - 30 + 1);
        assert_eq!(report.output.height(), 4);
        assert_eq!(report.rows.len(), 4);
        match (mode, &report.output) {
            (BackgroundMode::None, DeblurOutput::Quantized(img)) => {
                assert_eq!(img.layout(), PixelLayout::Rgba)
            }
            (BackgroundMode::Constant, DeblurOutput::Float(img)) => {
                assert_eq!(img.layout(), PixelLayout::Rgba)
            }
            other => panic!("unexpected output for {:?}", other.0),
        }
    }
}

#[test]
fn too_narrow_input_fails_without_output() {
    let code = generate_code(52, CodeMethod::Optimal).unwrap();
    let image = Image8::filled(33, 4, PixelLayout::Gray, 90);
    let err =
        deblur_with_background_estimation(&image, &code, 30, BackgroundMode::None, 0.005)
            .unwrap_err();
    assert!(matches!(err, ShutterError::InvalidArgument(_)));
}

// ── Codes and operators ────────────────────────────────────────

#[test]
fn named_codes_drive_the_smearing_operator() {
    let mura = generate_code_named(20, "mura").unwrap();
    assert_eq!(mura, generate_code_named(20, "mura").unwrap());

    let a = create_smearing_matrix(&mura, 20, 40).unwrap();
    assert_eq!(a.shape(), (59, 40));
    for j in 0..40 {
        let col_sum: f64 = a.column(j).iter().sum();
        assert!((col_sum - 1.0).abs() < 1e-9);
    }
    assert!(matches!(
        generate_code_named(20, "sine"),
        Err(ShutterError::InvalidArgument(_))
    ));
}
