//! Blur and deblur parameter sets.
//!
//! These are the values the surrounding application collects from the user
//! and hands to the engine. All of them serialize with lowercase enum names so
//! they can be stored alongside session records by the caller.

use crate::error::{Result, ShutterError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Near-optimal 52-bit flutter shutter sequence.
pub const OPTIMAL_CODE: &str = "1010000111000001010000110011110111010111001001100111";

/// Code length used by the application for every generated code.
pub const DEFAULT_CODE_LENGTH: usize = 52;

/// Default blur extent in pixels.
pub const DEFAULT_BLUR_LENGTH: usize = 100;

/// Default Tikhonov factor (scales the largest singular value).
pub const DEFAULT_REG_FACTOR: f64 = 0.005;

/// Lower bound applied to the regularization factor so that λ never reaches 0.
pub const MIN_REG_FACTOR: f64 = 1e-6;

/// Smallest recovered width the deconvolver accepts.
pub const MIN_DEBLURRED_WIDTH: usize = 5;

/// How the binary exposure code is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeMethod {
    /// Fixed 52-bit reference sequence, truncated or tiled.
    #[default]
    Optimal,
    /// Shutter always open.
    Box,
    /// Half of the slots open, chosen at random.
    Random,
    /// Slot open when its index is divisible by 2 or 3.
    Mura,
}

impl CodeMethod {
    pub const ALL: [CodeMethod; 4] = [Self::Optimal, Self::Box, Self::Random, Self::Mura];

    pub fn name(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Box => "box",
            Self::Random => "random",
            Self::Mura => "mura",
        }
    }
}

impl fmt::Display for CodeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodeMethod {
    type Err = ShutterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ShutterError::invalid(format!("Unknown code method: {s}")))
    }
}

/// Background model used while deblurring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Blurred object sits on black; plain inversion.
    None,
    /// One unknown scalar background per row, solved jointly.
    #[default]
    Constant,
    /// Textured background. Recognized but not implemented.
    Textured,
}

impl BackgroundMode {
    pub const ALL: [BackgroundMode; 3] = [Self::None, Self::Constant, Self::Textured];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Constant => "constant",
            Self::Textured => "textured",
        }
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackgroundMode {
    type Err = ShutterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ShutterError::invalid(format!("Unknown background type: {s}")))
    }
}

/// Diagnostic detail emitted while processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Normal,
    /// Per-row and singular-value diagnostics at `debug` level.
    Detailed,
}

impl Verbosity {
    #[inline]
    pub fn is_detailed(self) -> bool {
        matches!(self, Self::Detailed)
    }
}

/// Parameters for the forward motion-blur simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlurParams {
    pub code_method: CodeMethod,
    /// Number of slots in the exposure code.
    pub code_length: usize,
    /// Blur extent in pixels.
    pub blur_length: usize,
    /// Motion direction in degrees; 0 is rightward, 90 is downward.
    pub angle_degrees: f64,
    /// Seed for [`CodeMethod::Random`]. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            code_method: CodeMethod::Optimal,
            code_length: DEFAULT_CODE_LENGTH,
            blur_length: DEFAULT_BLUR_LENGTH,
            angle_degrees: 0.0,
            seed: None,
        }
    }
}

/// Parameters for deconvolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeblurParams {
    pub code_method: CodeMethod,
    pub code_length: usize,
    pub blur_length: usize,
    pub background: BackgroundMode,
    /// Tikhonov factor; λ = reg_factor · σ_max.
    pub reg_factor: f64,
    pub verbosity: Verbosity,
    pub seed: Option<u64>,
}

impl Default for DeblurParams {
    fn default() -> Self {
        Self {
            code_method: CodeMethod::Optimal,
            code_length: DEFAULT_CODE_LENGTH,
            blur_length: DEFAULT_BLUR_LENGTH,
            background: BackgroundMode::Constant,
            reg_factor: DEFAULT_REG_FACTOR,
            verbosity: Verbosity::Normal,
            seed: None,
        }
    }
}

impl DeblurParams {
    /// Regularization factor clamped to [`MIN_REG_FACTOR`].
    ///
    /// Non-finite or negative factors are rejected rather than clamped.
    pub fn effective_reg_factor(&self) -> Result<f64> {
        effective_reg_factor(self.reg_factor)
    }
}

/// Clamp a user-supplied regularization factor to the positive floor.
pub fn effective_reg_factor(reg_factor: f64) -> Result<f64> {
    if !reg_factor.is_finite() || reg_factor < 0.0 {
        return Err(ShutterError::invalid(format!(
            "Regularization factor must be a non-negative number, got {reg_factor}"
        )));
    }
    Ok(reg_factor.max(MIN_REG_FACTOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_method_round_trips_through_names() {
        for method in CodeMethod::ALL {
            assert_eq!(method.name().parse::<CodeMethod>().unwrap(), method);
        }
        assert!(matches!(
            "gold".parse::<CodeMethod>(),
            Err(ShutterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn background_mode_parses_textured() {
        assert_eq!(
            "textured".parse::<BackgroundMode>().unwrap(),
            BackgroundMode::Textured
        );
        assert!("checkered".parse::<BackgroundMode>().is_err());
    }

    #[test]
    fn params_serialize_lowercase() {
        let params = DeblurParams::default();
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"optimal\""));
        assert!(json.contains("\"constant\""));
        let back: DeblurParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn reg_factor_is_floored() {
        assert_eq!(effective_reg_factor(0.0).unwrap(), MIN_REG_FACTOR);
        assert_eq!(effective_reg_factor(0.01).unwrap(), 0.01);
        assert!(effective_reg_factor(f64::NAN).is_err());
        assert!(effective_reg_factor(-1.0).is_err());
    }

    #[test]
    fn optimal_code_literal_is_52_bits() {
        assert_eq!(OPTIMAL_CODE.len(), DEFAULT_CODE_LENGTH);
        assert!(OPTIMAL_CODE.chars().all(|c| c == '0' || c == '1'));
    }
}
