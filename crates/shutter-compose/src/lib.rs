//! Shutter Compose - the scene-level pipeline around the engine.
//!
//! Compositing with blur-offset correction, PSNR scoring against a sharp
//! reference, the synthetic demo scene, and the blur-angle sweep.

pub mod composite;
pub mod demo;
pub mod quality;
pub mod sweep;

pub use composite::{composite, place_blurred};
pub use demo::{demo_background, demo_object};
pub use quality::{align_reference, psnr, psnr_samples, score_output, PSNR_IDENTICAL};
pub use sweep::{run_angle, run_sweep, SweepConfig, SweepReport, SweepResult, SweepScene};
