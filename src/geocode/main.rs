//! Building footprint reverse geocoder.
//!
//! Loads footprints inside a mask, reverse geocodes their centroids against
//! Nominatim at a fixed pace and writes the parsed addresses out.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use footprints::crs::CentroidCrs;
use footprints::geocoder::NominatimClient;
use footprints::models::NO_ADDRESS_FOUND;
use footprints::output::write_footprints;
use footprints::pacing::RateLimit;
use footprints::parser::parse_addresses;
use footprints::source::{read_collection, GeoJsonSource, SourceFormat};
use footprints::{FootprintCollection, FootprintGeocoder, Mask};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "geocode")]
#[command(about = "Reverse geocode building footprints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Geocode the footprints inside a mask
    Run(RunArgs),
    /// Re-parse the addresses of an already geocoded GeoJSON file
    Parse {
        /// Geocoded GeoJSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (.csv or .geojson)
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Seconds to wait after each request (overrides config)
    #[arg(long)]
    rate_limit: Option<u64>,

    /// Projected CRS for centroids, e.g. EPSG:32616, or "auto" (overrides config)
    #[arg(long)]
    crs: Option<CentroidCrs>,

    /// Output file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Progress lines own stdout, logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Parse { input, output } => reparse(&input, &output),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = Config::load_from_file(&args.config)?;
    if let Some(secs) = args.rate_limit {
        config.rate_limit = RateLimit::from_secs(secs);
    }
    if let Some(crs) = args.crs {
        config.centroid_crs = crs;
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    info!("Footprint geocoder");
    info!("Footprints: {}", config.footprints.source.display());
    info!("Mask: {}", config.mask.path.display());
    info!("Geocoder: {}", config.geocoder.endpoint);
    info!("Rate limit: {}s", config.rate_limit.secs());

    let mask = Mask::from_geojson_file(&config.mask.path, config.mask.crs)
        .context("Failed to load mask")?;

    let mut source =
        GeoJsonSource::new(&config.footprints.source).with_format(config.footprints.format);
    if let Some(crs) = config.footprints.crs {
        source = source.with_crs(crs);
    }

    let client =
        NominatimClient::new(&config.geocoder).context("Failed to create geocoding client")?;

    let mut geocoder = FootprintGeocoder::new(source, mask, client, config.rate_limit);

    let cancel = geocoder.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping before the next request");
            cancel.cancel();
        }
    });

    let geocoded = geocoder
        .reverse_geocode_footprints(config.centroid_crs)
        .await
        .context("Reverse geocoding failed")?;
    let parsed = geocoder.address_parser(geocoded);

    summarize(&parsed);
    write_footprints(&config.output, &parsed).context("Failed to write output")?;

    Ok(())
}

fn reparse(input: &Path, output: &Path) -> Result<()> {
    let collection = read_collection(input, SourceFormat::Auto, None)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let parsed = parse_addresses(collection);
    summarize(&parsed);
    write_footprints(output, &parsed).context("Failed to write output")?;

    Ok(())
}

fn summarize(footprints: &FootprintCollection) {
    let found = footprints
        .iter()
        .filter(|f| f.address.as_deref().is_some_and(|a| a != NO_ADDRESS_FOUND))
        .count();
    let parsed = footprints
        .iter()
        .filter(|f| f.parsed_address.is_some())
        .count();

    info!(
        "{} footprints, {} with an address, {} parsed",
        footprints.len(),
        found,
        parsed
    );
}
