//! neurux-gaze — run the synthetic gaze simulator headless.
//!
//! Logs state transitions (at debug) and periodic status, and can write a
//! frame trace for visual regression diffs.

use neurux_gaze::gaze::Preset;
use neurux_gaze::geometry::Viewport;
use neurux_gaze::headless::{self, HeadlessConfig};

use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "neurux-gaze", about = "Synthetic eye-tracking gaze simulator")]
struct Cli {
    /// Tuning preset: hyper-scan or tour
    #[arg(long, default_value = "hyper-scan")]
    preset: String,

    /// Seed for a reproducible gaze path
    #[arg(long)]
    seed: Option<u64>,

    /// Viewport size (WxH)
    #[arg(long, default_value = "1920x1080")]
    viewport: String,

    /// Frame tick period in milliseconds
    #[arg(long, default_value = "16")]
    frame_interval_ms: f64,

    /// Drive dwell intensity from a scripted pointer sweep
    #[arg(long)]
    pointer_demo: bool,

    /// Exit after N seconds
    #[arg(long)]
    exit_after: Option<u64>,

    /// Seconds between status log lines
    #[arg(long, default_value = "5")]
    status_interval: u64,

    /// Write the frame trace (s-expressions) to this file on exit
    #[arg(long)]
    record: Option<std::path::PathBuf>,

    /// Check a recorded trace against a rerun with the same preset,
    /// viewport and seed, then exit
    #[arg(long, conflicts_with = "record")]
    verify: Option<std::path::PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neurux_gaze=info".into()),
        )
        .init();

    info!("neurux-gaze v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(preset) = Preset::from_str(&cli.preset) else {
        eprintln!("Unknown preset: {}. Use: hyper-scan or tour", cli.preset);
        std::process::exit(1);
    };

    let viewport = Viewport::parse(&cli.viewport).unwrap_or_else(|| {
        eprintln!("Invalid viewport '{}', using 1920x1080", cli.viewport);
        Viewport::default()
    });

    let config = HeadlessConfig {
        preset,
        viewport,
        seed: cli.seed,
        frame_interval_ms: cli.frame_interval_ms,
        pointer_demo: cli.pointer_demo,
        exit_after: cli.exit_after,
        status_interval_s: cli.status_interval,
        record: cli.record,
        ..HeadlessConfig::default()
    };

    match &cli.verify {
        Some(trace) => headless::verify(&config, trace),
        None => headless::run(config),
    }
}
