//! Live radar acquisition service.
//!
//! Polls the configured data servers for a station's newest radial volume,
//! runs the fetch/decode/resample pipeline, and writes GeoTIFF rasters to
//! the output directory.

mod config;
mod geotiff;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::ServiceConfig;
use geotiff::GeoTiffWriter;
use pipeline::Pipeline;
use radar_common::StationRegistry;
use transport::{ListingRequest, ServerEndpoint, Transport};

#[derive(Parser, Debug)]
#[command(name = "liveradar")]
#[command(about = "Live radar data acquisition and gridding")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/liveradar.yaml")]
    config: String,

    /// Station override (defaults to the configured station)
    #[arg(short, long)]
    station: Option<String>,

    /// Output directory override
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Run one cycle and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting liveradar service");

    let mut config = ServiceConfig::load(Path::new(&args.config))?;
    if let Some(station) = args.station {
        config.station = station;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    let registry = StationRegistry::builtin();
    let station = registry
        .validate(&config.station)
        .context("station validation failed")?
        .clone();
    info!(station = %station.id, site = %station.name, "Validated radar site");

    let grid_spec = config.grid.to_spec(&station)?;
    info!(
        nx = grid_spec.nx(),
        ny = grid_spec.ny(),
        resolution = grid_spec.resolution,
        "Target grid resolved"
    );

    let endpoints: Arc<[ServerEndpoint]> = Arc::from(config.endpoints.clone());
    let transport = Transport::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let mut pipeline = Pipeline::new(endpoints, transport, grid_spec, config.resample);
    if let Some(encoding) = config.gate_encoding_override()? {
        pipeline = pipeline.with_encoding_override(encoding);
    }
    let mut writer = GeoTiffWriter::new(config.output_dir.clone());

    let request = ListingRequest {
        path: config.listing.path_for(&station.id),
        suffix: config.listing.suffix.clone(),
    };

    loop {
        match pipeline.run_latest(&request, &mut writer).await {
            Ok(report) => {
                info!(
                    station = %report.station,
                    scan_time = %report.scan_time,
                    source = %report.source,
                    no_data = report.no_data_cells,
                    warnings = report.warnings.len(),
                    "Cycle complete"
                );
                for warning in &report.warnings {
                    warn!(station = %report.station, "{}", warning);
                }
            }
            // A failed run is final for this cycle; the next poll retries.
            Err(err) => warn!(error = %err, "Pipeline run failed"),
        }

        if args.once {
            break;
        }
        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
    }

    Ok(())
}
