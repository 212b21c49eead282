//! forcesar CLI - Sentinel-1 discovery and processing over a FORCE tile grid

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use forcesar_cloud::{PostFilters, SceneDiscovery, SearchFilters};
use forcesar_core::{AreaOfInterest, ReferenceGrid, RunConfig, SceneRecord};
use forcesar_processing::{output_name, BatchRunner, JobBuilder, JobDispatcher, JobStatus};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "forcesar")]
#[command(author, version, about = "Sentinel-1 discovery and processing for FORCE tile grids", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the tile range and show the area of interest
    Tiles {
        /// Parameter file
        params: PathBuf,
    },
    /// Query the catalog and list matching scenes
    Search {
        /// Parameter file
        params: PathBuf,
    },
    /// Discover scenes and process each one with the external tool
    Run {
        /// Parameter file
        params: PathBuf,
        /// Build jobs and print the commands without running them
        #[arg(long)]
        dry_run: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
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
            .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} written to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Configuration plus the clipped grid.
fn load(params: &Path) -> Result<(RunConfig, AreaOfInterest)> {
    let config = RunConfig::load(params)
        .with_context(|| format!("Invalid parameter file {}", params.display()))?;

    let tiles = config.tiles.resolve();
    info!("Tile range resolves to {} tiles", tiles.len());

    let pb = spinner("Reading grid...");
    let grid = ReferenceGrid::read(&config.grid)
        .with_context(|| format!("Failed to read grid {}", config.grid.display()))?;
    pb.finish_and_clear();

    let aoi = grid.clip(&tiles).context("Failed to build area of interest")?;
    if aoi.is_empty() && !tiles.is_empty() {
        warn!(
            "None of the {} requested tiles exist in {}",
            tiles.len(),
            config.grid.display()
        );
    }
    Ok((config, aoi))
}

async fn discover(config: &RunConfig, aoi: &AreaOfInterest) -> Result<Vec<SceneRecord>> {
    let discovery = SceneDiscovery::from_config(config).context("Failed to create catalog client")?;
    let pb = spinner(&format!("Querying {}...", config.repository));
    let scenes = discovery
        .discover(
            aoi,
            &SearchFilters::from_config(config),
            &config.orbits,
            &PostFilters::from_config(config),
        )
        .await;
    pb.finish_and_clear();
    let scenes = scenes.context("Scene discovery failed")?;
    info!("{} scenes found", scenes.len());
    Ok(scenes)
}

fn print_scenes(scenes: &[SceneRecord]) {
    for s in scenes {
        println!(
            "{}  {:>3}  {:<10}  {}  {}  {}",
            s.acquisition_date,
            s.relative_orbit_number,
            s.orbit_direction,
            s.platform,
            output_name(s),
            s.product_identifier
        );
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Tiles { params } => {
            let (config, aoi) = load(&params)?;
            for tile in aoi.tile_ids() {
                println!("{}", tile);
            }
            println!(
                "{} of {} tiles found in {}",
                aoi.len(),
                config.tiles.resolve().len(),
                config.grid.display()
            );
        }

        Commands::Search { params } => {
            let (config, aoi) = load(&params)?;
            let scenes = discover(&config, &aoi).await?;
            print_scenes(&scenes);
            println!("{} scenes", scenes.len());
        }

        Commands::Run { params, dry_run } => {
            let (config, aoi) = load(&params)?;
            let start = Instant::now();
            let scenes = discover(&config, &aoi).await?;

            if !dry_run {
                tokio::fs::create_dir_all(&config.output_dir)
                    .await
                    .with_context(|| {
                        format!("Failed to create {}", config.output_dir.display())
                    })?;
            }

            let builder = JobBuilder::new(&config.output_dir, config.processing.clone());
            let dispatcher = JobDispatcher::new(config.processing.clone());
            let pb = progress(scenes.len());
            let summary = BatchRunner::new(&builder, &dispatcher)
                .dry_run(dry_run)
                .run(&scenes, &aoi, |scene, status| {
                    match status {
                        JobStatus::Failed { code, .. } => pb.println(format!(
                            "FAILED ({:?}): {}",
                            code, scene.product_identifier
                        )),
                        JobStatus::Error { reason, .. } => {
                            pb.println(format!("ERROR: {}: {}", scene.product_identifier, reason))
                        }
                        _ => {}
                    }
                    pb.inc(1);
                })
                .await;
            pb.finish_and_clear();

            println!("{}", summary);
            done("Outputs", &config.output_dir, start.elapsed());
            if summary.failures() > 0 {
                anyhow::bail!("{} of {} jobs failed", summary.failures(), summary.scenes);
            }
        }
    }

    Ok(())
}
