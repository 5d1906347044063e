//! Shutter Engine - coded-exposure blur simulation and inversion
//!
//! The pipeline, leaf first:
//! - [`code`]: binary shutter codes by method
//! - [`psf`]: code → PSF resampling and the smearing operator
//! - [`geometry`]: padding and shift policy shared by blur and offset
//! - [`blur`]: forward motion blur of an image
//! - [`offset`]: placement correction for a blurred foreground
//! - [`deconvolve`]: row-wise Tikhonov inversion with optional constant
//!   background

pub mod blur;
pub mod code;
pub mod deconvolve;
pub mod geometry;
pub mod offset;
pub mod psf;

pub use blur::{apply_motion_blur, apply_motion_blur_with};
pub use code::{generate_code, generate_code_named, CodeGenerator, ExposureCode};
pub use deconvolve::{
    deblur_channel, deblur_channel_with_constant_bg, deblur_image,
    deblur_with_background_estimation, ChannelDeblur, DeblurOutput, DeblurReport, Deconvolver,
    PreparedOperator, RegularizedInverse, RowOutcome,
};
pub use geometry::BlurGeometry;
pub use offset::{calculate_blur_offset, BlurOffset};
pub use psf::{
    code_to_psf, create_smearing_matrix, extend_for_constant_background,
    smearing_matrix_for_psf, Psf,
};
