//! stopfinder CLI - Debug tool for stop estimation
//!
//! Usage:
//!   stopfinder-cli estimate <points.json> [--resolution <n>] [--kernel-width <w>]
//!   stopfinder-cli synthetic [--stops <n>] [--seed <s>] [--output <file>]
//!
//! The points file is a JSON array of `{"x": .., "y": .., "weight": ..}`
//! objects (`weight` optional). Estimated stops are written as a JSON array
//! of `[latitude, longitude]` pairs.

use clap::{Parser, Subcommand};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stopfinder::{
    EstimateConfig, Estimator, GpsPoint, KernelCovariance,
    synthetic::StopScenario,
};

#[derive(Parser)]
#[command(name = "stopfinder-cli")]
#[command(about = "Debug tool for bus-stop estimation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate stop locations from a points file
    Estimate {
        /// JSON file with the position samples
        input: PathBuf,

        /// Output file for the stops (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Evaluation grid width and height
        #[arg(short, long, default_value = "100")]
        resolution: usize,

        /// Kernel bandwidth factor
        #[arg(short, long, default_value = "0.1")]
        kernel_width: f64,

        /// Ignore the per-point weights
        #[arg(long)]
        unweighted: bool,

        /// Keep the off-diagonal covariance term in the kernel
        #[arg(long)]
        full_covariance: bool,

        /// Snap stops to the street network via OSRM
        #[cfg(feature = "http")]
        #[arg(long)]
        snap: bool,

        /// OSRM host used with --snap
        #[cfg(feature = "http")]
        #[arg(long, default_value = "http://router.project-osrm.org")]
        osrm_host: String,
    },

    /// Generate a synthetic points file with known stops
    Synthetic {
        /// Number of stops along the corridor
        #[arg(short, long, default_value = "5")]
        stops: usize,

        /// Distance between neighbouring stops
        #[arg(long, default_value = "10")]
        spacing: f64,

        /// Pings generated around each stop
        #[arg(long, default_value = "50")]
        pings: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// One record of a points file.
#[derive(Debug, Serialize, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Estimate {
            input,
            output,
            resolution,
            kernel_width,
            unweighted,
            full_covariance,
            #[cfg(feature = "http")]
            snap,
            #[cfg(feature = "http")]
            osrm_host,
        } => {
            let config = EstimateConfig {
                weighted: !unweighted,
                resolution,
                kernel_width,
                covariance: if full_covariance {
                    KernelCovariance::Full
                } else {
                    KernelCovariance::Diagonal
                },
            };
            #[cfg(feature = "http")]
            let snap_host = snap.then_some(osrm_host);
            #[cfg(not(feature = "http"))]
            let snap_host: Option<String> = None;
            run_estimate(&input, output.as_deref(), &config, snap_host)
        }
        Commands::Synthetic {
            stops,
            spacing,
            pings,
            seed,
            output,
        } => run_synthetic(stops, spacing, pings, seed, output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load a points file into coordinates and (optional) weights.
///
/// Weights are only returned when every record carries one.
fn load_points(path: &Path) -> Result<(Vec<[f64; 2]>, Option<Vec<f64>>), String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let records: Vec<PointRecord> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    let points: Vec<[f64; 2]> = records.iter().map(|r| [r.x, r.y]).collect();
    let weights: Option<Vec<f64>> = records.iter().map(|r| r.weight).collect();
    Ok((points, weights))
}

fn run_estimate(
    input: &Path,
    output: Option<&Path>,
    config: &EstimateConfig,
    snap_host: Option<String>,
) -> Result<(), String> {
    let (points, weights) = load_points(input)?;
    info!(
        "Loaded {} points from {} ({})",
        points.len(),
        input.display(),
        if weights.is_some() { "weighted" } else { "unweighted" }
    );

    let mut estimator = Estimator::new(&points).map_err(|e| e.to_string())?;
    estimator.set_weights(weights).map_err(|e| e.to_string())?;

    let b = estimator.boundaries();
    info!(
        "Boundaries x=[{:.6}, {:.6}] y=[{:.6}, {:.6}]",
        b.min_x, b.max_x, b.min_y, b.max_y
    );

    let stops = match snap_host {
        Some(host) => snap_stops(&mut estimator, config, host)?,
        None => estimator.estimate_stops(config).map_err(|e| e.to_string())?,
    };

    if let Some(surface) = estimator.density_surface()
        && let Some((row, col, value)) = surface.peak()
    {
        info!("Density peak {:.4e} at cell ({}, {})", value, row, col);
    }

    for (i, stop) in stops.iter().enumerate() {
        info!(
            "  Stop {}: lat={:.6} lng={:.6}",
            i + 1,
            stop.latitude,
            stop.longitude
        );
    }

    let pairs: Vec<(f64, f64)> = stops.iter().map(GpsPoint::as_tuple).collect();
    write_json(&pairs, output)
}

#[cfg(feature = "http")]
fn snap_stops(
    estimator: &mut Estimator,
    config: &EstimateConfig,
    host: String,
) -> Result<Vec<GpsPoint>, String> {
    use stopfinder::{OsrmSnapper, SnapConfig};

    let snapper = OsrmSnapper::new(SnapConfig {
        host,
        ..SnapConfig::default()
    })
    .map_err(|e| e.to_string())?;
    let batch = estimator
        .estimate_stops_snapped(config, &snapper)
        .map_err(|e| e.to_string())?;
    info!(
        "Snapped {}/{} stops ({} kept unsnapped)",
        batch.snapped_count(),
        batch.len(),
        batch.failed_count()
    );
    Ok(batch.resolve())
}

#[cfg(not(feature = "http"))]
fn snap_stops(
    _estimator: &mut Estimator,
    _config: &EstimateConfig,
    _host: String,
) -> Result<Vec<GpsPoint>, String> {
    Err("snapping requires the `http` feature".to_string())
}

fn run_synthetic(
    stops: usize,
    spacing: f64,
    pings: usize,
    seed: u64,
    output: Option<&Path>,
) -> Result<(), String> {
    let scenario = StopScenario {
        seed,
        ..StopScenario::corridor(stops.max(1), spacing, pings)
    };
    let dataset = scenario.generate();

    info!(
        "Generated {} pings ({} around {} stops, {} background)",
        dataset.metadata.total_points,
        dataset.metadata.stop_points,
        dataset.stops.len(),
        dataset.metadata.background_points
    );
    for (i, stop) in dataset.stops.iter().enumerate() {
        info!("  Stop {}: x={:.3} y={:.3}", i + 1, stop.x, stop.y);
    }

    let records: Vec<PointRecord> = dataset
        .points
        .iter()
        .zip(&dataset.weights)
        .map(|(p, w)| PointRecord {
            x: p.x,
            y: p.y,
            weight: Some(*w),
        })
        .collect();
    write_json(&records, output)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), String> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value).map_err(|e| e.to_string())?;
            writer.flush().map_err(|e| e.to_string())?;
            info!("Wrote {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}
