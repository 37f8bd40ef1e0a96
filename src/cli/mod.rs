//! Command-line interface for the membership pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::processors::membership;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "cluster-mst")]
#[command(about = "Open cluster membership from proper-motion minimum spanning trees", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract cluster members from a catalog CSV
    Members {
        /// Input catalog CSV
        catalog: PathBuf,
        /// Output directory for member, trace and transition CSVs
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Source id to grow the tree from
        #[arg(long)]
        seed_id: Option<u64>,
        /// Fixed regression window half-width
        #[arg(long)]
        window_half_width: Option<usize>,
    },

    /// Sweep sky radii to find the covering radius
    Radius {
        /// Input catalog CSV
        catalog: PathBuf,
        /// Output directory for sweep and covering CSVs
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Source id whose position is the sweep center
        #[arg(long, conflicts_with_all = ["center_ra", "center_dec"])]
        center_id: Option<u64>,
        /// Sweep center right ascension (deg)
        #[arg(long, requires = "center_dec", allow_negative_numbers = true)]
        center_ra: Option<f64>,
        /// Sweep center declination (deg)
        #[arg(long, requires = "center_ra", allow_negative_numbers = true)]
        center_dec: Option<f64>,
        /// Largest radius to sweep
        #[arg(long)]
        max_radius: Option<f64>,
        /// Radius increment
        #[arg(long)]
        step: Option<f64>,
        /// Source id to grow each sample's tree from
        #[arg(long)]
        seed_id: Option<u64>,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Output YAML path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {:#}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Members { catalog, output_dir, seed_id, window_half_width } => {
            cmd_members(&catalog, output_dir, seed_id, window_half_width, config);
        }
        Commands::Radius {
            catalog,
            output_dir,
            center_id,
            center_ra,
            center_dec,
            max_radius,
            step,
            seed_id,
        } => {
            let center = center_ra.zip(center_dec).map(|(ra, dec)| [ra, dec]);
            cmd_radius(&catalog, output_dir, center, center_id, max_radius, step, seed_id, config);
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path, &config);
        }
    }
}

fn cmd_members(
    catalog: &Path,
    output_dir: Option<PathBuf>,
    seed_id: Option<u64>,
    window_half_width: Option<usize>,
    mut config: PipelineConfig,
) {
    let start = Instant::now();

    // CLI flags override config values
    if seed_id.is_some() {
        config.membership.seed_id = seed_id;
    }
    if window_half_width.is_some() {
        config.inclination.window_half_width = window_half_width;
    }

    println!("Extracting cluster members...");
    println!("Input: {}", catalog.display());
    println!("Parameters:");
    match config.membership.seed_id {
        Some(id) => println!("  seed: {}", id),
        None => println!("  seed: nearest to mean proper motion"),
    }
    match config.inclination.window_half_width {
        Some(n) => println!("  window half-width: {}", n),
        None => println!("  window factor: {}", config.inclination.window_factor),
    }

    let spinner = create_spinner("Growing minimum spanning tree...");

    match membership::process_catalog_members(catalog, output_dir.as_deref(), &config) {
        Ok((output, result)) => {
            spinner.finish_and_clear();

            let analysis = &result.analysis;
            let peak = analysis
                .peak
                .index
                .map_or("none".to_string(), |i| format!("{} (eta {:.4})", i, analysis.peak.value));

            print_summary(
                "Membership Complete",
                &[
                    ("Input file", catalog.display().to_string()),
                    ("Members CSV", output.members_csv.display().to_string()),
                    ("Sources", analysis.growth.total_vertices.to_string()),
                    ("Seed", analysis.seed.to_string()),
                    ("Window half-width", analysis.window_half_width.to_string()),
                    ("Transition index", peak),
                    ("Members", result.members.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Membership failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_radius(
    catalog: &Path,
    output_dir: Option<PathBuf>,
    center: Option<[f64; 2]>,
    center_id: Option<u64>,
    max_radius: Option<f64>,
    step: Option<f64>,
    seed_id: Option<u64>,
    mut config: PipelineConfig,
) {
    let start = Instant::now();

    if center.is_some() {
        config.sweep.center = center;
        config.sweep.center_id = None;
    } else if center_id.is_some() {
        config.sweep.center = None;
        config.sweep.center_id = center_id;
    }
    config.sweep.max_radius = max_radius.unwrap_or(config.sweep.max_radius);
    config.sweep.step = step.unwrap_or(config.sweep.step);
    if seed_id.is_some() {
        config.membership.seed_id = seed_id;
    }

    println!("Sweeping covering radius...");
    println!("Input: {}", catalog.display());
    println!("Parameters:");
    println!("  max_radius: {}", config.sweep.max_radius);
    println!("  step: {}", config.sweep.step);
    println!("  distance_scale: {}", config.sweep.distance_scale);

    let spinner = create_spinner("Sweeping radii...");

    match membership::process_catalog_radius(catalog, output_dir.as_deref(), &config) {
        Ok((output, result)) => {
            spinner.finish_and_clear();

            let sweep = &result.sweep;
            let radius = sweep
                .covering_radius
                .map_or("none".to_string(), |r| format!("{:.3}", r));

            print_summary(
                "Radius Sweep Complete",
                &[
                    ("Input file", catalog.display().to_string()),
                    ("Sweep CSV", output.sweep_csv.display().to_string()),
                    (
                        "Center",
                        format!("{:.5}, {:.5}", result.center[0], result.center[1]),
                    ),
                    ("Radii sampled", sweep.samples.len().to_string()),
                    ("Covering radius", radius),
                    ("Peak eta", format!("{:.6}", sweep.eta_max)),
                    ("Threshold", format!("{:.6}", sweep.threshold)),
                    ("Significant", sweep.significant.to_string()),
                    ("Covering members", result.covering.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Radius sweep failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) {
    match config.to_yaml(path) {
        Ok(()) => println!("Wrote config to {}", path.display()),
        Err(e) => {
            error!("Failed to write config: {:#}", e);
            std::process::exit(1);
        }
    }
}
