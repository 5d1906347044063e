//! Angle sweeps on the demo scene.

use shutter_compose::{run_sweep, SweepConfig, SweepReport, SweepScene};
use shutter_core::{BackgroundMode, BlurParams, CodeMethod};

fn config(blur_length: usize, background: BackgroundMode) -> SweepConfig {
    SweepConfig {
        angle_start: 0.0,
        angle_end: 90.0,
        angle_step: 90.0,
        blur: BlurParams {
            blur_length,
            ..Default::default()
        },
        background,
        ..Default::default()
    }
}

#[test]
fn demo_sweep_scores_both_axes() {
    let report = run_sweep(&SweepScene::demo(), &config(20, BackgroundMode::Constant)).unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failures(), 0);
    assert_eq!(report.code.len(), 52);

    let angles: Vec<f64> = report.results.iter().map(|r| r.angle).collect();
    assert_eq!(angles, vec![0.0, 90.0]);
    assert!(report.best().is_some());
}

#[test]
fn textured_background_fails_every_angle() {
    let report = run_sweep(&SweepScene::demo(), &config(20, BackgroundMode::Textured)).unwrap();
    assert_eq!(report.failures(), 2);
    assert!(report.best().is_none());
    assert!(report.results.iter().all(|r| r.psnr.is_none()));
}

#[test]
fn seeded_random_sweeps_repeat() {
    let mut cfg = config(20, BackgroundMode::None);
    cfg.angle_end = 0.0;
    cfg.blur.code_method = CodeMethod::Random;
    cfg.blur.seed = Some(17);

    let first = run_sweep(&SweepScene::demo(), &cfg).unwrap();
    let second = run_sweep(&SweepScene::demo(), &cfg).unwrap();
    assert_eq!(first, second);

    let json = serde_json::to_string(&first).unwrap();
    let back: SweepReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.code, first.code);
    let (a, b) = (back.results[0].psnr.unwrap(), first.results[0].psnr.unwrap());
    assert!((a - b).abs() < 1e-9);
}
