//! Shutter Sweep - blur the demo scene at a range of angles, deblur each
//! result and report the PSNR against the sharp composite.

use anyhow::{Context, Result};
use clap::Parser;
use shutter_compose::{run_sweep, SweepConfig, SweepReport, SweepScene};
use shutter_core::{
    BackgroundMode, BlurParams, CodeMethod, Verbosity, DEFAULT_BLUR_LENGTH, DEFAULT_CODE_LENGTH,
    DEFAULT_REG_FACTOR,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug, Clone)]
#[command(name = "shutter-sweep", version, about)]
struct Args {
    /// First blur angle in degrees
    #[arg(long, default_value_t = 0.0)]
    angle_start: f64,

    /// Last blur angle in degrees (inclusive)
    #[arg(long, default_value_t = 180.0)]
    angle_end: f64,

    /// Step between angles in degrees
    #[arg(long, default_value_t = 5.0)]
    angle_step: f64,

    /// Blur length in pixels
    #[arg(long, default_value_t = DEFAULT_BLUR_LENGTH)]
    blur_length: usize,

    /// Exposure code method: optimal, box, random or mura
    #[arg(long, default_value = "optimal")]
    code: CodeMethod,

    /// Background model for deblurring: none, constant or textured
    #[arg(long, default_value = "constant")]
    background: BackgroundMode,

    /// Tikhonov factor, relative to the largest singular value
    #[arg(long, default_value_t = DEFAULT_REG_FACTOR)]
    reg_factor: f64,

    /// Seed for the random code method
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Debug-level logging and per-row deconvolution diagnostics
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            angle_start: self.angle_start,
            angle_end: self.angle_end,
            angle_step: self.angle_step,
            blur: BlurParams {
                code_method: self.code,
                code_length: DEFAULT_CODE_LENGTH,
                blur_length: self.blur_length,
                // Sweeps take every angle from the grid.
                angle_degrees: 0.0,
                seed: self.seed,
            },
            background: self.background,
            reg_factor: self.reg_factor,
            verbosity: if self.verbose {
                Verbosity::Detailed
            } else {
                Verbosity::Normal
            },
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.sweep_config();
    info!(
        start = config.angle_start,
        end = config.angle_end,
        step = config.angle_step,
        "Shutter sweep starting..."
    );

    let scene = SweepScene::demo();
    let report = run_sweep(&scene, &config).context("sweep could not start")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }
    Ok(())
}

fn print_table(report: &SweepReport) {
    println!("code: {}", report.code);
    println!("{:>8}  {:>10}  {:>12}  status", "angle", "psnr (dB)", "offset");
    for r in &report.results {
        let psnr = r
            .psnr
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "N/A".into());
        let offset = r
            .offset
            .map(|o| format!("({}, {})", o.x, o.y))
            .unwrap_or_else(|| "-".into());
        let status = match &r.error {
            Some(e) => e.clone(),
            None if r.unsolved_rows > 0 => format!("{} rows unsolved", r.unsolved_rows),
            None => "ok".into(),
        };
        println!("{:>8.1}  {psnr:>10}  {offset:>12}  {status}", r.angle);
    }
    match report.best() {
        Some(best) => println!(
            "optimal blur angle: {:.1} deg (PSNR {:.2} dB)",
            best.angle,
            best.psnr.unwrap_or_default()
        ),
        None => println!("no valid PSNR measurements"),
    }
}
