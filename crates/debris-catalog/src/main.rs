//! Debris Trajectory CLI
//!
//! Ground tracks, orbit paths and live constellation frames from a debris
//! catalog.
//!
//! Usage:
//!   debris-track --catalog data/debris_catalog.json track --norad 25544 --geojson
//!   debris-track --catalog data/debris_catalog.json orbit --norad 25544
//!   debris-track --catalog data/debris_catalog.json live --ticks 10
//!   debris-track --catalog data/debris_catalog.json stats

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use debris_catalog::{build_trajectory, geojson, live, loader, CatalogStats};
use orbital_mechanics::{LiveConfig, SamplingConfig, ViewFit};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "debris-track",
    about = "Ground tracks, orbit paths and live positions for reentry debris"
)]
struct Args {
    /// Path to the debris catalog JSON file
    #[arg(short, long, default_value = "data/debris_catalog.json")]
    catalog: PathBuf,

    /// Orbital revolutions covered by tracks and paths
    #[arg(long, default_value_t = SamplingConfig::default().revolutions)]
    revolutions: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segmented ground track of one object
    Track {
        /// NORAD catalog number
        #[arg(short, long)]
        norad: u64,

        /// Output JSON file
        #[arg(short, long, default_value = "ground_track.json")]
        output: PathBuf,

        /// Also output GeoJSON
        #[arg(long)]
        geojson: bool,
    },
    /// 3D orbit path of one object in scene coordinates
    Orbit {
        /// NORAD catalog number
        #[arg(short, long)]
        norad: u64,

        /// Output JSON file
        #[arg(short, long, default_value = "orbit_path.json")]
        output: PathBuf,
    },
    /// Step a live session over the whole catalog
    Live {
        /// Number of ticks to simulate
        #[arg(short, long, default_value_t = 1)]
        ticks: u32,

        /// Output JSON file for the last frame
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Catalog summary
    Stats,
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    info!("Writing {:?}", path);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let records = loader::load_catalog(&args.catalog)?;
    let sampling = SamplingConfig {
        revolutions: args.revolutions,
        ..SamplingConfig::default()
    };

    match args.command {
        Command::Track {
            norad,
            output,
            geojson: export_geojson,
        } => {
            let record = loader::find_by_norad(&records, norad)?;
            let trajectory = build_trajectory(record, &sampling)?;

            if let Some(age) = trajectory.tle_age {
                warn!("{}", age.notice());
            }
            match trajectory.view_fit {
                ViewFit::Bounds(b) => info!(
                    "Track bounds: lat {:.2}..{:.2}, lon {:.2}..{:.2}",
                    b.south, b.north, b.west, b.east
                ),
                ViewFit::Center { latitude, longitude, .. } => {
                    info!("No ground track available, centering on {:.2}, {:.2}", latitude, longitude)
                }
                ViewFit::NoData => warn!("No ground track available"),
            }
            info!(
                "{}: {} segments, {}/{} samples kept",
                trajectory.name,
                trajectory.ground_track.segments.len(),
                trajectory.ground_track.point_count(),
                trajectory.ground_track.samples_attempted
            );

            write_json(&output, &trajectory.ground_track)?;
            if export_geojson {
                write_json(&output.with_extension("geojson"), &geojson::to_geojson(&trajectory))?;
            }
        }
        Command::Orbit { norad, output } => {
            let record = loader::find_by_norad(&records, norad)?;
            let trajectory = build_trajectory(record, &sampling)?;

            if !trajectory.orbit_path.is_drawable() {
                warn!("No orbit path available for {}", trajectory.name);
            }
            info!(
                "{}: {} path points ({} samples skipped)",
                trajectory.name,
                trajectory.orbit_path.points.len(),
                trajectory.orbit_path.samples_skipped
            );
            write_json(&output, &trajectory.orbit_path)?;
        }
        Command::Live { ticks, output } => {
            let mut session = live::start_session(&records, Utc::now(), LiveConfig::default());
            let mut frame = session.current_frame();
            for _ in 0..ticks {
                frame = session.tick();
            }
            info!(
                "Frame at {}: {} positions, {} dropped",
                frame.time,
                frame.positions.len(),
                frame.dropped
            );
            if let Some(output) = output {
                write_json(&output, &frame)?;
            }
        }
        Command::Stats => {
            let stats = CatalogStats::from_records(&records);
            info!("Total objects: {}", stats.total);
            info!("  Payloads: {}", stats.payload);
            info!("  Debris and rocket bodies: {}", stats.debris);
            info!("  With TLE: {} / without: {}", stats.with_tle, stats.without_tle);
        }
    }

    Ok(())
}
