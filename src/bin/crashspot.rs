//! Command line front end for crash data exploration.
//!
//! ```text
//! crashspot summary --crashes crashes.geojson [--year 2022 --night --top 5]
//! crashspot hotspots --risk predicted_crash_risk.geojson [--top 25]
//! crashspot drive --risk predicted_crash_risk.geojson --track drive.geojson
//! ```
//!
//! Set `RUST_LOG=debug` for detailed logs.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use crashspot::geo_utils::coordinate_key;
use crashspot::layers::read_feature_collection;
use crashspot::{
    CrashFilter, CrashMapState, CrashspotConfig, CrashspotError, DriveEvent, DriveSession,
    GeoPoint, LayerPaths, PositionEvent,
};
use geojson::Value as Geometry;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "crashspot", about = "Explore crash data, hotspots and drive alerts")]
struct Cli {
    /// TOML file overriding aliases, grid and alert settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs, top locations and the densest cells of a crash file
    Summary {
        /// Crash FeatureCollection
        #[arg(long)]
        crashes: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Number of top locations and dense cells to show
        #[arg(long, default_value = "5")]
        top: usize,
    },
    /// Print ranked hotspots from a predicted-risk file
    Hotspots {
        /// Predicted-risk FeatureCollection
        #[arg(long)]
        risk: PathBuf,
        /// Number of hotspots to show
        #[arg(long, default_value = "25")]
        top: usize,
    },
    /// Replay a recorded track through a drive session
    Drive {
        /// Predicted-risk FeatureCollection
        #[arg(long)]
        risk: PathBuf,
        /// LineString or Point features, in driving order
        #[arg(long)]
        track: PathBuf,
        /// Override the trigger radius in meters
        #[arg(long)]
        radius: Option<f64>,
    },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
    #[arg(long, default_value = "0")]
    hour_min: u32,
    #[arg(long, default_value = "23")]
    hour_max: u32,
    /// Saturday and Sunday only
    #[arg(long)]
    weekend: bool,
    /// 18:00 to 06:59 only
    #[arg(long)]
    night: bool,
    /// Fatal crashes only
    #[arg(long)]
    fatal: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> CrashFilter {
        CrashFilter {
            year: self.year,
            month: self.month,
            weekend_only: self.weekend,
            night_only: self.night,
            fatal_only: self.fatal,
            ..CrashFilter::default()
        }
        .with_hour_range(self.hour_min, self.hour_max)
    }
}

/// Positions of a track file in order: LineString vertices and Points.
fn read_track(path: &Path) -> Result<Vec<GeoPoint>, CrashspotError> {
    let collection = read_feature_collection(path)?;
    let mut points = Vec::new();
    for feature in &collection.features {
        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Geometry::Point(p)) => points.extend(GeoPoint::from_position(p)),
            Some(Geometry::LineString(line)) => {
                points.extend(line.iter().filter_map(|p| GeoPoint::from_position(p)))
            }
            _ => {}
        }
    }
    Ok(points)
}

fn summary(
    mut config: CrashspotConfig,
    crashes: &Path,
    filter: CrashFilter,
    top: usize,
) -> Result<(), CrashspotError> {
    config.top_locations = top;

    let mut state = CrashMapState::new(config);
    state.load_layers(&LayerPaths {
        crashes: crashes.to_path_buf(),
        clusters: None,
        roads: None,
        risk: None,
    })?;
    state.apply_filter(filter);

    let summary = state.insights();
    println!("Crashes:    {}", summary.total);
    println!("Fatal:      {}", summary.fatal);
    println!("Injuries:   {}", summary.injuries);
    println!("Peak hour:  {}", summary.peak_hour_label());

    println!("\nTop locations");
    println!("{:<4} {:<24} {:<6} ADDRESS", "#", "POSITION", "COUNT");
    for (i, loc) in summary.top_locations.iter().enumerate() {
        println!(
            "{:<4} {:<24} {:<6} {}",
            i + 1,
            coordinate_key(&loc.position, 5),
            loc.count,
            loc.sample_address
        );
    }

    let grid = state.density_grid();
    println!("\nDensest cells ({} non-empty)", grid.cells.len());
    for cell in grid.densest(top) {
        println!(
            "{:<24} {:<6} {:?}",
            coordinate_key(&cell.center, 4),
            cell.count,
            cell.tier
        );
    }
    Ok(())
}

fn hotspots(config: CrashspotConfig, risk: &Path, top: usize) -> Result<(), CrashspotError> {
    let mut state = CrashMapState::new(config);
    let total = state.load_risk(&read_feature_collection(risk)?);

    println!("{:<4} {:<24} SCORE", "#", "POSITION");
    for (i, h) in state.hotspots().iter().take(top).enumerate() {
        println!("{:<4} {:<24} {}", i + 1, h.key(), h.score);
    }
    println!("\n{} hotspot(s) ranked", total);
    Ok(())
}

async fn drive(
    mut config: CrashspotConfig,
    risk: &Path,
    track: &Path,
    radius: Option<f64>,
) -> Result<(), CrashspotError> {
    if let Some(radius) = radius {
        config.alert.trigger_radius_meters = radius;
    }
    let mut state = CrashMapState::new(config);
    state.load_risk(&read_feature_collection(risk)?);

    let fixes: Vec<PositionEvent> = read_track(track)?.into_iter().map(PositionEvent::Fix).collect();
    println!("Replaying {} fixes against {} hotspots", fixes.len(), state.hotspots().len());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = DriveSession::spawn(state.alert_engine(), futures::stream::iter(fixes), tx);

    while let Some(event) = rx.recv().await {
        match event {
            DriveEvent::Alert(alert) => println!(
                "ALERT  #{} {} score {}: {}",
                alert.rank + 1,
                alert.hotspot.key(),
                alert.hotspot.score,
                alert
            ),
            DriveEvent::Status(status) => println!("STATUS {}", status),
        }
    }

    session.finished().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CrashspotConfig::load(path)?,
        None => CrashspotConfig::default(),
    };

    match cli.command {
        Commands::Summary { crashes, filter, top } => {
            summary(config, &crashes, filter.to_filter(), top)?
        }
        Commands::Hotspots { risk, top } => hotspots(config, &risk, top)?,
        Commands::Drive { risk, track, radius } => drive(config, &risk, &track, radius).await?,
    }
    Ok(())
}
