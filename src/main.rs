use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;

use quadeval::detection::{DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};
use quadeval::evaluation::{OverlayWriter, collect_images};
use quadeval::metrics::DEFAULT_CANVAS_SIZE;
use quadeval::{
    AnnotationStore, Evaluator, IouCanvas, MatchStrategy, RectangleDetector, ReportFormat,
};

#[derive(Parser)]
#[command(name = "quadeval")]
#[command(about = "Score rectangle detection against annotated polygons (IoU per image)")]
struct Cli {
    /// VIA annotation JSON with ground-truth polygons
    #[arg(value_name = "ANNOTATIONS")]
    annotations: PathBuf,

    /// Directory containing the images to evaluate
    #[arg(value_name = "IMAGE_DIR")]
    image_dir: PathBuf,

    /// Report file to write (overwritten)
    #[arg(value_name = "REPORT")]
    report: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Which ground-truth region a detection is compared with
    #[arg(long = "match", value_enum, default_value_t = MatchStrategy::First)]
    strategy: MatchStrategy,

    /// Images processed concurrently
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Give up on an image after this many seconds (0 disables)
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Side length of the square IoU raster canvas
    #[arg(long, default_value_t = DEFAULT_CANVAS_SIZE)]
    canvas_size: u32,

    /// Canny low threshold
    #[arg(long, default_value_t = DEFAULT_LOW_THRESHOLD)]
    low_threshold: f32,

    /// Canny high threshold
    #[arg(long, default_value_t = DEFAULT_HIGH_THRESHOLD)]
    high_threshold: f32,

    /// Save preview images with detection and ground truth drawn (must be empty)
    #[arg(long, value_name = "DIR")]
    overlay_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if !args.image_dir.is_dir() {
        anyhow::bail!("Directory not found: {}", args.image_dir.display());
    }
    let images = collect_images(&args.image_dir)?;
    info!("Found images: {}", images.len());

    let mut report = args.format.create(&args.report)?;

    let mut evaluator = Evaluator::new(Arc::new(AnnotationStore::load_or_empty(&args.annotations)))
        .with_detector(
            RectangleDetector::default().with_thresholds(args.low_threshold, args.high_threshold),
        )
        .with_canvas(IouCanvas::square(args.canvas_size))
        .with_strategy(args.strategy)
        .with_jobs(args.jobs)
        .with_timeout((args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)));

    if let Some(dir) = args.overlay_dir {
        evaluator = evaluator.with_overlay(OverlayWriter::new(dir)?);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("failed to start runtime")?;
    let summary = runtime.block_on(evaluator.run(images, report.as_mut()))?;
    // don't wait on blocking tasks abandoned after a timeout
    runtime.shutdown_background();

    info!("{summary}");
    info!("Report written to {}", args.report.display());

    Ok(())
}
