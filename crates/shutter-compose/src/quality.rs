//! PSNR and the alignment needed to compare a deblurred crop with its
//! sharp reference.

use shutter_core::{Image8, Rect, Result, ShutterError};
use shutter_engine::DeblurOutput;

/// PSNR reported for identical inputs.
pub const PSNR_IDENTICAL: f64 = 100.0;

const MAX_PIXEL: f64 = 255.0;

/// Peak signal-to-noise ratio of `processed` against `reference` in dB.
pub fn psnr(reference: &Image8, processed: &Image8) -> Result<f64> {
    if reference.shape() != processed.shape() {
        let (h, w, c) = reference.shape();
        let (ph, pw, pc) = processed.shape();
        return Err(ShutterError::DimensionMismatch {
            expected: format!("{h}x{w}x{c}"),
            actual: format!("{ph}x{pw}x{pc}"),
        });
    }
    let mse = mean_squared_error(
        reference.data().iter().map(|v| *v as f64),
        processed.data().iter().map(|v| *v as f64),
        reference.data().len(),
    );
    Ok(psnr_from_mse(mse))
}

/// PSNR over raw samples on the 8-bit scale.
pub fn psnr_samples(reference: &[f64], processed: &[f64]) -> Result<f64> {
    if reference.len() != processed.len() {
        return Err(ShutterError::DimensionMismatch {
            expected: format!("{} samples", reference.len()),
            actual: format!("{} samples", processed.len()),
        });
    }
    let mse = mean_squared_error(
        reference.iter().copied(),
        processed.iter().copied(),
        reference.len(),
    );
    Ok(psnr_from_mse(mse))
}

fn mean_squared_error(
    a: impl Iterator<Item = f64>,
    b: impl Iterator<Item = f64>,
    len: usize,
) -> f64 {
    if len == 0 {
        return 0.0;
    }
    a.zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>() / len as f64
}

fn psnr_from_mse(mse: f64) -> f64 {
    if mse == 0.0 {
        return PSNR_IDENTICAL;
    }
    20.0 * (MAX_PIXEL / mse.sqrt()).log10()
}

/// PSNR of a deblurred result against `reference`.
///
/// Float output is scored as is, without clipping to the 8-bit range.
pub fn score_output(reference: &Image8, output: &DeblurOutput) -> Result<f64> {
    match output {
        DeblurOutput::Quantized(img) => psnr(reference, img),
        DeblurOutput::Float(img) => {
            if reference.shape() != img.shape() {
                let (h, w, c) = reference.shape();
                let (ph, pw, pc) = img.shape();
                return Err(ShutterError::DimensionMismatch {
                    expected: format!("{h}x{w}x{c}"),
                    actual: format!("{ph}x{pw}x{pc}"),
                });
            }
            let expected: Vec<f64> = reference.data().iter().map(|v| *v as f64).collect();
            let actual: Vec<f64> = img.data().iter().map(|v| *v as f64).collect();
            psnr_samples(&expected, &actual)
        }
    }
}

/// Center-crop `reference` to `width × height`.
pub fn align_reference(reference: &Image8, width: usize, height: usize) -> Result<Image8> {
    if width > reference.width() || height > reference.height() {
        return Err(ShutterError::DimensionMismatch {
            expected: format!("at most {}x{}", reference.width(), reference.height()),
            actual: format!("{width}x{height}"),
        });
    }
    let left = (reference.width() - width) / 2;
    let top = (reference.height() - height) / 2;
    reference.crop(Rect::new(left, top, width, height))
}
