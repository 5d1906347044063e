//! Blur-angle sweep: blur, recomposite, crop, deblur and score a scene at
//! a range of motion angles.

use crate::composite::{composite, place_blurred};
use crate::demo::{demo_background, demo_object};
use crate::quality::{align_reference, score_output};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shutter_core::{
    BackgroundMode, BlurParams, Image8, Rect, Result, ShutterError, Verbosity, DEFAULT_REG_FACTOR,
};
use shutter_engine::{
    apply_motion_blur, calculate_blur_offset, BlurOffset, CodeGenerator, Deconvolver,
    ExposureCode,
};
use tracing::{info, warn};

/// Angles and pipeline parameters for a sweep.
///
/// The code and blur length in `blur` drive both the blur and the deblur.
/// `blur.angle_degrees` is not read: every angle comes from the sweep grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub angle_start: f64,
    pub angle_end: f64,
    pub angle_step: f64,
    pub blur: BlurParams,
    pub background: BackgroundMode,
    pub reg_factor: f64,
    pub verbosity: Verbosity,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            angle_start: 0.0,
            angle_end: 180.0,
            angle_step: 5.0,
            blur: BlurParams::default(),
            background: BackgroundMode::Constant,
            reg_factor: DEFAULT_REG_FACTOR,
            verbosity: Verbosity::Normal,
        }
    }
}

impl SweepConfig {
    /// Angles from `angle_start` up to `angle_end`, the end included when
    /// it falls within half a step of the grid.
    pub fn angles(&self) -> Result<Vec<f64>> {
        let (start, end, step) = (self.angle_start, self.angle_end, self.angle_step);
        if !(step.is_finite() && step > 0.0) || !start.is_finite() || !end.is_finite() {
            return Err(ShutterError::invalid(format!(
                "Invalid sweep range {start}..{end} step {step}"
            )));
        }
        let limit = end + step / 2.0;
        let count = ((limit - start) / step).ceil().max(0.0) as usize;
        Ok((0..count).map(|i| start + i as f64 * step).collect())
    }
}

/// The images and placement a sweep runs on.
#[derive(Debug, Clone)]
pub struct SweepScene {
    pub background: Image8,
    pub foreground: Image8,
    /// Top-left of the sharp foreground on the background.
    pub position: (i64, i64),
    /// Region of both composites that is deblurred and scored.
    pub crop: Rect,
}

impl SweepScene {
    /// Scene cropped to the background minus a 10% margin on every side.
    pub fn new(background: Image8, foreground: Image8, position: (i64, i64)) -> Self {
        let (w, h) = (background.width() as f64, background.height() as f64);
        let (mx, my) = ((w / 10.0).floor(), (h / 10.0).floor());
        let corners = [[mx, my], [w - mx, my], [w - mx, h - my], [mx, h - my]];
        let crop = Rect::bounding_box(&corners).unwrap_or_default();
        Self {
            background,
            foreground,
            position,
            crop,
        }
    }

    pub fn with_crop(mut self, crop: Rect) -> Self {
        self.crop = crop;
        self
    }

    /// Crop to the bounding box of points marked on the background, such
    /// as the corners of a selected quad.
    pub fn with_crop_points(self, points: &[[f64; 2]]) -> Result<Self> {
        let crop = Rect::bounding_box(points)
            .ok_or_else(|| ShutterError::invalid("Crop needs at least one point"))?;
        let (w, h) = (self.background.width(), self.background.height());
        if crop.width == 0 || crop.height == 0 || !crop.fits_within(w, h) {
            return Err(ShutterError::invalid(format!(
                "Crop {crop:?} does not fit a {w}x{h} background"
            )));
        }
        Ok(self.with_crop(crop))
    }

    /// The demo object centered on the demo background.
    pub fn demo() -> Self {
        let background = demo_background();
        let foreground = demo_object();
        let x = (background.width() - foreground.width()) / 2;
        let y = (background.height() - foreground.height()) / 2;
        Self::new(background, foreground, (x as i64, y as i64))
    }
}

/// Outcome at one angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub angle: f64,
    pub psnr: Option<f64>,
    pub offset: Option<BlurOffset>,
    /// Rows the deconvolver could not solve, over all channels.
    pub unsolved_rows: usize,
    pub error: Option<String>,
}

impl SweepResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(angle: f64, error: &ShutterError) -> Self {
        Self {
            angle,
            psnr: None,
            offset: None,
            unsolved_rows: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Results of a sweep in angle order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub code: String,
    pub results: Vec<SweepResult>,
}

impl SweepReport {
    /// Result with the highest PSNR.
    pub fn best(&self) -> Option<&SweepResult> {
        self.results
            .iter()
            .filter(|r| r.psnr.is_some_and(f64::is_finite))
            .max_by(|a, b| a.psnr.unwrap_or(f64::MIN).total_cmp(&b.psnr.unwrap_or(f64::MIN)))
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success()).count()
    }
}

/// Run the full pipeline at every angle of `config`.
///
/// Angles run in parallel. A failing angle yields a failed [`SweepResult`]
/// and the sweep continues.
pub fn run_sweep(scene: &SweepScene, config: &SweepConfig) -> Result<SweepReport> {
    let angles = config.angles()?;
    let code = CodeGenerator::from_seed(config.blur.seed)
        .generate(config.blur.code_length, config.blur.code_method)?;
    let deconvolver = Deconvolver::new(&code, config.blur.blur_length, config.reg_factor)?
        .with_verbosity(config.verbosity);

    info!(
        angles = angles.len(),
        blur_length = config.blur.blur_length,
        code_method = %config.blur.code_method,
        background = %config.background,
        "Starting angle sweep"
    );

    let results: Vec<SweepResult> = angles
        .par_iter()
        .map(|&angle| {
            match run_angle(scene, &code, &deconvolver, config, angle) {
                Ok(result) => result,
                Err(e) => {
                    warn!(angle, error = %e, "Sweep angle failed");
                    SweepResult::failed(angle, &e)
                }
            }
        })
        .collect();

    let report = SweepReport {
        code: code.to_string(),
        results,
    };
    match report.best() {
        Some(best) => info!(angle = best.angle, psnr = ?best.psnr, "Sweep finished"),
        None => warn!("Sweep produced no valid PSNR"),
    }
    Ok(report)
}

/// One angle of the sweep.
pub fn run_angle(
    scene: &SweepScene,
    code: &ExposureCode,
    deconvolver: &Deconvolver,
    config: &SweepConfig,
    angle: f64,
) -> Result<SweepResult> {
    let k = config.blur.blur_length;

    let reference = composite(&scene.background, &scene.foreground, scene.position.0, scene.position.1)?;
    let blurred_fg = apply_motion_blur(&scene.foreground, code, k, angle)?;
    let offset = calculate_blur_offset(code, k, angle)?;
    let blurred = place_blurred(&scene.background, &blurred_fg, scene.position, offset)?;

    let cropped_reference = reference.crop(scene.crop)?;
    let cropped_blurred = blurred.crop(scene.crop)?;

    let report = deconvolver.deblur_with_background_estimation(&cropped_blurred, config.background)?;
    let unsolved_rows = report.failed_rows();

    let aligned = align_reference(&cropped_reference, report.output.width(), report.output.height())?;
    let score = score_output(&aligned, &report.output)?;

    info!(angle, psnr = score, offset_x = offset.x, offset_y = offset.y, "Angle scored");
    Ok(SweepResult {
        angle,
        psnr: Some(score),
        offset: Some(offset),
        unsolved_rows,
        error: None,
    })
}
