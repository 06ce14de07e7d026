mod follow;
mod import;
mod pincodes;
mod retailers;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use retailmap_core::dashboard::LOAD_TROUBLESHOOTING;
use retailmap_core::markers::cluster_color;
use retailmap_core::{AppConfig, MapSettings};

#[derive(Debug, Parser)]
#[command(name = "retailmap")]
#[command(about = "Retailer map dashboard command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List retailers after applying filters and deep-link overrides
    Retailers(retailers::RetailerArgs),
    /// Query pincode boundaries for one viewport
    Pincodes(pincodes::PincodeArgs),
    /// Feed viewport changes from stdin ("zoom west south east north") through the loader
    Follow,
    /// Import pincode boundary polygons from a GeoJSON file
    ImportPincodes(import::ImportArgs),
    /// Show the effective configuration and map settings
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Summary,
    Json,
    Geojson,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match retailmap_core::load_app_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            eprintln!("troubleshooting:");
            for line in LOAD_TROUBLESHOOTING {
                eprintln!("  - {line}");
            }
            return Err(err.into());
        }
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Retailers(args) => retailers::run_retailers(&config, &args).await,
        Commands::Pincodes(args) => pincodes::run_pincodes(&config, &args).await,
        Commands::Follow => follow::run_follow(&config).await,
        Commands::ImportPincodes(args) => import::run_import(&config, &args).await,
        Commands::Config => run_config(&config),
    }
}

/// Map settings from `RETAILMAP_MAP_SETTINGS`, or the built-in defaults.
pub(crate) fn map_settings(config: &AppConfig) -> anyhow::Result<MapSettings> {
    match &config.map_settings_path {
        Some(path) => Ok(retailmap_core::load_map_settings(path)?),
        None => Ok(MapSettings::default()),
    }
}

fn run_config(config: &AppConfig) -> anyhow::Result<()> {
    let settings = map_settings(config)?;
    println!("{config:#?}");
    println!(
        "map: style={} initial view=({}, {}) zoom {} clusters up to zoom {}",
        settings.style,
        settings.initial_view.latitude,
        settings.initial_view.longitude,
        settings.initial_view.zoom,
        settings.cluster.max_zoom
    );
    println!(
        "zoom range {}..{}, fit to markers with {}px padding up to zoom {}",
        settings.min_zoom, settings.max_zoom, settings.fit_padding, settings.fit_max_zoom
    );
    println!(
        "cluster colors: <10 {}, 10-29 {}, 30+ {} (radius {}px)",
        cluster_color(1),
        cluster_color(10),
        cluster_color(30),
        settings.cluster.radius
    );
    for style in &settings.status_colors {
        println!(
            "status {:<10} {} {}",
            style.name,
            style.color,
            style.icon.as_deref().unwrap_or("-")
        );
    }
    if let Err(err) = config.require_map_token() {
        println!("warning: {err}; the map view cannot be rendered without it");
    }
    Ok(())
}

#[cfg(test)]
mod tests;
