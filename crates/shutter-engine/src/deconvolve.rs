//! Row-wise Tikhonov deconvolution of coded motion blur.
//!
//! Rows are the blur axis. Each row of length `W` is reflect-padded, then
//! solved against the smearing operator of the padded width through a
//! regularized pseudo-inverse built once per image. Row failures are
//! recorded per row and never abort the image.

use crate::code::{CodeGenerator, ExposureCode};
use crate::psf::{extend_for_constant_background, smearing_matrix_for_psf, Psf};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use shutter_core::{
    effective_reg_factor, BackgroundMode, DeblurParams, Image8, ImageF32, Plane, Result,
    ShutterError, Verbosity, MIN_DEBLURRED_WIDTH,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one image row during deconvolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Solved,
    /// The row was left at zero. Holds a [`ShutterError::RowSolveFailure`].
    Failed(ShutterError),
    /// Cancellation was requested before the row started.
    Cancelled,
}

impl RowOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved)
    }
}

/// Tikhonov-damped pseudo-inverse `V · diag(σ / (σ² + λ²)) · Uᵀ` with
/// `λ = reg_factor · σ_max`.
#[derive(Debug, Clone)]
pub struct RegularizedInverse {
    pinv: DMatrix<f64>,
    lambda: f64,
    sigma_max: f64,
}

impl RegularizedInverse {
    pub fn new(operator: DMatrix<f64>, reg_factor: f64) -> Result<Self> {
        let reg_factor = effective_reg_factor(reg_factor)?;
        let (rows, cols) = operator.shape();
        if rows == 0 || cols == 0 {
            return Err(ShutterError::invalid("Operator must not be empty"));
        }

        let svd = operator.svd(true, true);
        let u = svd
            .u
            .ok_or_else(|| ShutterError::Internal("SVD did not produce U".into()))?;
        let mut v_t = svd
            .v_t
            .ok_or_else(|| ShutterError::Internal("SVD did not produce Vᵀ".into()))?;
        let sigma = svd.singular_values;

        let sigma_max = sigma.iter().copied().fold(0.0, f64::max);
        if !sigma_max.is_finite() || sigma_max <= 0.0 {
            return Err(ShutterError::Internal(format!(
                "Degenerate operator: largest singular value is {sigma_max}"
            )));
        }
        let lambda = reg_factor * sigma_max;
        let lambda_sq = lambda * lambda;

        for (i, s) in sigma.iter().enumerate() {
            v_t.row_mut(i).scale_mut(s / (s * s + lambda_sq));
        }
        let pinv = v_t.transpose() * u.transpose();

        Ok(Self {
            pinv,
            lambda,
            sigma_max,
        })
    }

    /// Solve `x = pinv · rhs`.
    pub fn solve(&self, rhs: &[f64]) -> Result<DVector<f64>> {
        if rhs.len() != self.pinv.ncols() {
            return Err(ShutterError::DimensionMismatch {
                expected: format!("{} samples", self.pinv.ncols()),
                actual: format!("{} samples", rhs.len()),
            });
        }
        let x = &self.pinv * DVector::from_column_slice(rhs);
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ShutterError::Internal("Non-finite solution".into()));
        }
        Ok(x)
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn sigma_max(&self) -> f64 {
        self.sigma_max
    }

    /// `(unknowns, observations)`
    pub fn shape(&self) -> (usize, usize) {
        self.pinv.shape()
    }
}

/// A pseudo-inverse bound to one blurred width.
#[derive(Debug, Clone)]
pub struct PreparedOperator {
    inverse: RegularizedInverse,
    width: usize,
    pad: usize,
    deblurred_width: usize,
    with_background: bool,
}

impl PreparedOperator {
    /// Width of the blurred rows this operator accepts.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Width of the recovered rows, `width − k + 1`.
    pub fn deblurred_width(&self) -> usize {
        self.deblurred_width
    }

    pub fn pad(&self) -> usize {
        self.pad
    }

    pub fn with_background(&self) -> bool {
        self.with_background
    }

    pub fn inverse(&self) -> &RegularizedInverse {
        &self.inverse
    }

    /// Solve one blurred row that has already been reflect-padded.
    fn solve_row(&self, row: usize, padded: &[f64], out: &mut [f64]) -> Result<()> {
        let x = self
            .inverse
            .solve(padded)
            .map_err(|e| ShutterError::RowSolveFailure {
                row,
                reason: e.to_string(),
            })?;
        let background = if self.with_background {
            x[x.len() - 1]
        } else {
            0.0
        };
        for (dst, v) in out.iter_mut().zip(x.iter().skip(self.pad)) {
            *dst = v + background;
        }
        Ok(())
    }
}

/// One deblurred channel and the fate of each of its rows.
#[derive(Debug, Clone)]
pub struct ChannelDeblur {
    pub plane: Plane,
    pub rows: Vec<RowOutcome>,
}

impl ChannelDeblur {
    pub fn failed_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_solved()).count()
    }
}

/// Deblurred pixels: 8-bit for the plain mode, float for the
/// background-aware mode so callers can keep chaining before quantizing.
#[derive(Debug, Clone, PartialEq)]
pub enum DeblurOutput {
    Quantized(Image8),
    Float(ImageF32),
}

impl DeblurOutput {
    pub fn width(&self) -> usize {
        match self {
            Self::Quantized(img) => img.width(),
            Self::Float(img) => img.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Quantized(img) => img.height(),
            Self::Float(img) => img.height(),
        }
    }
}

/// Deblurred image plus per-channel, per-row outcomes.
#[derive(Debug, Clone)]
pub struct DeblurReport {
    pub output: DeblurOutput,
    pub rows: Vec<Vec<RowOutcome>>,
}

impl DeblurReport {
    pub fn failed_rows(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|r| !r.is_solved())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_rows() == 0
    }
}

/// Inverts coded motion blur along image rows.
#[derive(Debug, Clone)]
pub struct Deconvolver {
    psf: Psf,
    reg_factor: f64,
    verbosity: Verbosity,
    cancel: Option<Arc<AtomicBool>>,
}

impl Deconvolver {
    pub fn new(code: &ExposureCode, blur_length: usize, reg_factor: f64) -> Result<Self> {
        if blur_length == 0 {
            return Err(ShutterError::invalid("Blur length must be positive"));
        }
        Ok(Self {
            psf: Psf::for_code(code, blur_length)?,
            reg_factor: effective_reg_factor(reg_factor)?,
            verbosity: Verbosity::Normal,
            cancel: None,
        })
    }

    /// Build from parameters, generating the code they name.
    pub fn from_params(params: &DeblurParams) -> Result<Self> {
        let code =
            CodeGenerator::from_seed(params.seed).generate(params.code_length, params.code_method)?;
        Ok(Self::new(&code, params.blur_length, params.reg_factor)?.with_verbosity(params.verbosity))
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Rows that have not started when `flag` goes high are skipped and
    /// reported as [`RowOutcome::Cancelled`].
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn blur_length(&self) -> usize {
        self.psf.len()
    }

    pub fn reg_factor(&self) -> f64 {
        self.reg_factor
    }

    /// Build the regularized pseudo-inverse for rows of `width` samples.
    pub fn prepare(&self, width: usize, with_background: bool) -> Result<PreparedOperator> {
        let k = self.blur_length();
        if width + 1 < k + MIN_DEBLURRED_WIDTH {
            return Err(ShutterError::invalid(format!(
                "Deblurred width too small: width {width} with blur length {k} leaves {}",
                (width + 1).saturating_sub(k)
            )));
        }
        let deblurred_width = width + 1 - k;
        let pad = k.div_ceil(2);
        let padded_n = deblurred_width + 2 * pad;

        let mut operator = smearing_matrix_for_psf(&self.psf, padded_n);
        if with_background {
            operator = extend_for_constant_background(&operator);
        }
        let inverse = RegularizedInverse::new(operator, self.reg_factor)?;

        if self.verbosity.is_detailed() {
            debug!(
                width,
                pad,
                padded_n,
                with_background,
                sigma_max = inverse.sigma_max(),
                lambda = inverse.lambda(),
                "Prepared regularized inverse"
            );
        }

        Ok(PreparedOperator {
            inverse,
            width,
            pad,
            deblurred_width,
            with_background,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Solve every row of `channel` with a prepared operator.
    pub fn deblur_plane(&self, channel: &Plane, op: &PreparedOperator) -> Result<ChannelDeblur> {
        if channel.width != op.width {
            return Err(ShutterError::DimensionMismatch {
                expected: format!("width {}", op.width),
                actual: format!("width {}", channel.width),
            });
        }

        let n = op.deblurred_width;
        let padded = channel.reflect_pad_horizontal(op.pad);
        let mut plane = Plane::new(n, channel.height);

        let rows: Vec<RowOutcome> = plane
            .data
            .par_chunks_mut(n)
            .enumerate()
            .map(|(y, out)| {
                if self.is_cancelled() {
                    return RowOutcome::Cancelled;
                }
                match op.solve_row(y, padded.row(y), out) {
                    Ok(()) => {
                        if self.verbosity.is_detailed() {
                            debug!(row = y, "Row solved");
                        }
                        RowOutcome::Solved
                    }
                    Err(e) => {
                        warn!(row = y, error = %e, "Row solve failed; leaving row at zero");
                        out.fill(0.0);
                        RowOutcome::Failed(e)
                    }
                }
            })
            .collect();

        Ok(ChannelDeblur { plane, rows })
    }

    /// Deblur one channel with no background term.
    pub fn deblur_channel(&self, channel: &Plane) -> Result<ChannelDeblur> {
        let op = self.prepare(channel.width, false)?;
        self.deblur_plane(channel, &op)
    }

    /// Deblur one channel, solving a constant background per row and adding
    /// it back onto the recovered signal.
    pub fn deblur_channel_with_constant_bg(&self, channel: &Plane) -> Result<ChannelDeblur> {
        let op = self.prepare(channel.width, true)?;
        self.deblur_plane(channel, &op)
    }

    /// Deblur every channel with no background term and quantize to 8 bits.
    pub fn deblur_image(&self, image: &Image8) -> Result<DeblurReport> {
        self.deblur_with_background_estimation(image, BackgroundMode::None)
    }

    /// Deblur every channel in the given background mode.
    ///
    /// `None` yields an 8-bit image, `Constant` a float image. `Textured` is
    /// not available.
    pub fn deblur_with_background_estimation(
        &self,
        image: &Image8,
        mode: BackgroundMode,
    ) -> Result<DeblurReport> {
        let with_background = match mode {
            BackgroundMode::None => false,
            BackgroundMode::Constant => true,
            BackgroundMode::Textured => {
                return Err(ShutterError::NotSupported(
                    "Textured background estimation is not implemented".into(),
                ))
            }
        };

        info!(
            width = image.width(),
            height = image.height(),
            channels = image.channels(),
            blur_length = self.blur_length(),
            background = %mode,
            "Deblurring image"
        );

        // Channels share the width, hence the operator.
        let op = self.prepare(image.width(), with_background)?;
        let mut planes = Vec::with_capacity(image.channels());
        let mut rows = Vec::with_capacity(image.channels());
        for channel in image.planes() {
            let result = self.deblur_plane(&channel, &op)?;
            planes.push(result.plane);
            rows.push(result.rows);
        }

        let output = if with_background {
            DeblurOutput::Float(ImageF32::from_planes(&planes)?)
        } else {
            DeblurOutput::Quantized(Image8::from_planes(&planes)?)
        };
        let report = DeblurReport { output, rows };

        let failed = report.failed_rows();
        if failed > 0 {
            warn!(failed, "Deblur finished with unsolved rows");
        }
        Ok(report)
    }
}

/// Deblur one channel with no background term.
pub fn deblur_channel(
    channel: &Plane,
    code: &ExposureCode,
    blur_length: usize,
    reg_factor: f64,
) -> Result<ChannelDeblur> {
    Deconvolver::new(code, blur_length, reg_factor)?.deblur_channel(channel)
}

/// Deblur one channel with a per-row constant background.
pub fn deblur_channel_with_constant_bg(
    channel: &Plane,
    code: &ExposureCode,
    blur_length: usize,
    reg_factor: f64,
) -> Result<ChannelDeblur> {
    Deconvolver::new(code, blur_length, reg_factor)?.deblur_channel_with_constant_bg(channel)
}

/// Deblur all channels with no background term.
pub fn deblur_image(
    image: &Image8,
    code: &ExposureCode,
    blur_length: usize,
    reg_factor: f64,
) -> Result<DeblurReport> {
    Deconvolver::new(code, blur_length, reg_factor)?.deblur_image(image)
}

/// Deblur all channels in `mode`.
pub fn deblur_with_background_estimation(
    image: &Image8,
    code: &ExposureCode,
    blur_length: usize,
    mode: BackgroundMode,
    reg_factor: f64,
) -> Result<DeblurReport> {
    if mode == BackgroundMode::Textured {
        return Err(ShutterError::NotSupported(
            "Textured background estimation is not implemented".into(),
        ));
    }
    Deconvolver::new(code, blur_length, reg_factor)?.deblur_with_background_estimation(image, mode)
}
