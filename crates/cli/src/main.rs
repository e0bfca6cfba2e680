//! Coastview CLI - coastal line-of-sight exposure per compass sector

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use coastview_algorithms::exposure::{DirectionalExposure, ExposureEvaluator, OceanLayer};
use coastview_batch::dump::dump_layers;
use coastview_batch::{
    context, read_ocean, read_points, BatchConfig, BatchDriver, Checkpoint, ResultSink, Session,
};
use coastview_core::io::read_geotiff;
use coastview_core::{PropertyPoint, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "coastview")]
#[command(author, version, about = "Coastal line-of-sight exposure analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every point of a dataset, resuming from the checkpoint
    Run {
        /// Points CSV with header id,x,y,lat,lon
        points: PathBuf,
        /// Land/ocean code GeoTIFF
        ocean: PathBuf,
        /// Output CSV (appended to)
        output: PathBuf,
        /// Checkpoint log [default: <output>.done]
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Stop after this many newly processed points
        #[arg(long)]
        max_rows: Option<usize>,
        /// Lowest point identifier to process
        #[arg(long)]
        start_id: Option<u64>,
        /// Highest point identifier to process
        #[arg(long)]
        end_id: Option<u64>,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Evaluate a single point and print its exposure per sector
    Point {
        /// Points CSV with header id,x,y,lat,lon
        points: PathBuf,
        /// Land/ocean code GeoTIFF
        ocean: PathBuf,
        /// Identifier of the point to evaluate
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

/// Settings shared by every analysis command
#[derive(Args)]
struct AnalysisArgs {
    /// Grid cell size in map units
    #[arg(long, default_value = "10")]
    cell_size: f64,
    /// Analysis radius around each point in map units
    #[arg(short, long, default_value = "1000")]
    radius: f64,
    /// Height of neighboring buildings
    #[arg(long, default_value = "10")]
    obstruction_height: f64,
    /// Land/ocean code that marks ocean
    #[arg(long, default_value = "200")]
    ocean_code: f64,
    /// Eye height above the ground at each point
    #[arg(long, default_value = "0")]
    observer_height: f64,
    /// Sample spacing along sight lines, in cells
    #[arg(long, default_value = "0.5")]
    sample_spacing: f64,
    /// Worker threads (0 = all cores)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
    /// Largest analysis grid accepted, in cells
    #[arg(long, default_value = "4000000")]
    max_cells: usize,
    /// Write intermediate grids of every point to this directory
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

impl AnalysisArgs {
    fn config(&self) -> BatchConfig {
        BatchConfig {
            cell_size: self.cell_size,
            analysis_radius: self.radius,
            obstruction_height: self.obstruction_height,
            ocean_code: self.ocean_code,
            observer_height: self.observer_height,
            sample_spacing: self.sample_spacing,
            threads: self.threads,
            max_cells_per_grid: self.max_cells,
            dump_dir: self.dump_dir.clone(),
            ..Default::default()
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} points ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

fn load_inputs(points: &Path, ocean: &Path) -> Result<(Vec<PropertyPoint>, OceanLayer)> {
    let pb = spinner("Reading inputs...");
    let points = read_points(points)
        .with_context(|| format!("Failed to read points from {}", points.display()))?;
    let ocean = read_ocean(ocean)
        .with_context(|| format!("Failed to read land/ocean layer from {}", ocean.display()))?;
    pb.finish_and_clear();
    Ok((points, ocean))
}

fn default_checkpoint(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".done");
    PathBuf::from(name)
}

fn flag(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

// ─── Commands ───────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run_batch(
    points: PathBuf,
    ocean: PathBuf,
    output: PathBuf,
    checkpoint: Option<PathBuf>,
    max_rows: Option<usize>,
    start_id: Option<u64>,
    end_id: Option<u64>,
    analysis: AnalysisArgs,
) -> Result<()> {
    let config = BatchConfig {
        max_rows,
        start_id,
        end_id,
        ..analysis.config()
    };
    let (points, ocean) = load_inputs(&points, &ocean)?;
    let driver = BatchDriver::new(config, points).context("Invalid configuration")?;

    let checkpoint_path = checkpoint.unwrap_or_else(|| default_checkpoint(&output));
    let checkpoint = Checkpoint::open(&checkpoint_path)
        .with_context(|| format!("Failed to open checkpoint {}", checkpoint_path.display()))?;
    let mut session = Session::new(checkpoint);
    let mut sink = ResultSink::append(&output)
        .with_context(|| format!("Failed to open output {}", output.display()))?;

    let (pending, _) = driver.pending(session.checkpoint());
    let pb = progress(pending.len());
    let summary = driver
        .run(&ocean, &mut session, &mut sink, |_| pb.inc(1))
        .context("Batch session failed")?;
    pb.finish_and_clear();

    if summary.is_finished() {
        println!("Zero points processed: every point in range is already done.");
    } else {
        println!("Results appended to: {}", output.display());
        println!("{}", summary);
    }
    Ok(())
}

fn run_point(points: PathBuf, ocean: PathBuf, id: u64, analysis: AnalysisArgs) -> Result<()> {
    let config = analysis.config();
    let (points, ocean) = load_inputs(&points, &ocean)?;
    let driver = BatchDriver::new(config, points).context("Invalid configuration")?;
    let target = driver
        .index()
        .points()
        .iter()
        .find(|p| p.id == id)
        .copied()
        .with_context(|| format!("No point with identifier {}", id))?;

    let start = Instant::now();
    let config = driver.config();
    let ctx = context::extract(driver.index(), &target, config.analysis_radius, &ocean);
    info!(id, nearby = ctx.nearby.len(), "evaluating point");

    let evaluator = ExposureEvaluator::new(config.evaluator_params());
    let layers = evaluator
        .run_pipeline(&ctx)
        .with_context(|| format!("Exposure unavailable for point {}", id))?;
    let elapsed = start.elapsed();

    if let Some(dir) = &config.dump_dir {
        dump_layers(dir, id, &layers).context("Failed to dump intermediate grids")?;
        println!("Intermediate grids saved to: {}", dir.display());
    }

    let exposure = DirectionalExposure::from_table(layers.table);
    println!("Point {} ({}, {})", id, target.x, target.y);
    println!("Exposed in any direction: {}", flag(exposure.exposed_at_all_overall));
    println!(
        "\n  {:<10} {:>8} {:>8} {:>10} {:>8}",
        "Sector", "Exposed", "Highly", "Rate", "Cells"
    );
    for (sector, stats) in exposure.iter() {
        println!(
            "  {:<10} {:>8} {:>8} {:>10.4} {:>8}",
            sector,
            flag(stats.exposed_at_all),
            flag(stats.highly_exposed),
            stats.exposure_rate,
            stats.total
        );
    }
    println!("\n  Processing time: {:.2?}", elapsed);
    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(&input).context("Failed to read raster")?;
    pb.finish_and_clear();

    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            points,
            ocean,
            output,
            checkpoint,
            max_rows,
            start_id,
            end_id,
            analysis,
        } => run_batch(points, ocean, output, checkpoint, max_rows, start_id, end_id, analysis),
        Commands::Point {
            points,
            ocean,
            id,
            analysis,
        } => run_point(points, ocean, id, analysis),
        Commands::Info { input } => show_info(input),
    }
}
