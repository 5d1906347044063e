//! Shutter Core - foundation types for coded-exposure processing
//!
//! This crate provides the types shared by the blur engine and its callers:
//! - Interleaved images and single-channel working planes
//! - Pixel rectangles for cropping
//! - Blur / deblur parameter sets and defaults
//! - The error taxonomy

pub mod error;
pub mod geometry;
pub mod image;
pub mod params;

pub use error::{Result, ShutterError};
pub use geometry::Rect;
pub use image::{reflect_index, Image, Image8, ImageF32, PixelLayout, Plane, Sample};
pub use params::{
    effective_reg_factor, BackgroundMode, BlurParams, CodeMethod, DeblurParams, Verbosity,
    DEFAULT_BLUR_LENGTH, DEFAULT_CODE_LENGTH, DEFAULT_REG_FACTOR, MIN_DEBLURRED_WIDTH,
    MIN_REG_FACTOR, OPTIMAL_CODE,
};
