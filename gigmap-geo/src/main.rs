//! gigmap - concert map and listing generator
//!
//! Resolves venue coordinates for past concerts and writes the datasets the
//! website map reads. Also maintains the manual override file.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gigmap_common::config::{
    default_config_path, load_config, write_toml_config, ConfigResolver, LoggingConfig, TomlConfig,
};
use gigmap_common::time::today;
use gigmap_geo::services::override_store::{manual_entry, search_url, validate_position, OverrideFile};
use gigmap_geo::services::{EventQuery, JsonFileSource, OverrideStore};
use gigmap_geo::workflow::{build_listing, MapPipeline, Resolver};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for gigmap
#[derive(Parser, Debug)]
#[command(name = "gigmap")]
#[command(about = "Concert map and listing generator")]
#[command(version)]
struct Args {
    /// Config file (overrides GIGMAP_CONFIG and the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve past concerts and write the raw and map datasets
    Map {
        /// Event export to read instead of the configured one
        #[arg(long)]
        events: Option<PathBuf>,

        /// Only process the N most recent events
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write the upcoming-concerts listing
    Listing {
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Maintain manual venue coordinates
    Override {
        #[command(subcommand)]
        action: OverrideCommand,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum OverrideCommand {
    /// Record coordinates for a venue
    Add {
        name: String,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
        note: Option<String>,
    },

    /// Print a maps search link for finding a venue by hand
    Search { name: String, locality: Option<String> },

    /// Mark a venue's stored coordinates as wrong so the next run re-resolves it
    Flag { pattern: String, note: Option<String> },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let source = ConfigResolver::new(args.config.clone()).resolve();
    let config = load_config(&source).context("Failed to load configuration")?;

    init_logging(&config.logging)?;

    info!(
        "Starting gigmap v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match source.path() {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: built-in defaults"),
    }

    match args.command {
        Command::Map { events, limit } => run_map(&config, events, limit).await,
        Command::Listing { events } => run_listing(&config, events).await,
        Command::Override { action } => run_override(&config, action),
        Command::Config { action } => match action {
            ConfigCommand::Init { force } => init_config(args.config, force),
        },
    }
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

fn events_source(config: &TomlConfig, events: Option<PathBuf>) -> JsonFileSource {
    JsonFileSource::new(events.unwrap_or_else(|| config.events_path()))
}

async fn run_map(config: &TomlConfig, events: Option<PathBuf>, limit: Option<usize>) -> Result<()> {
    let source = events_source(config, events);
    let mut query = EventQuery::past(today());
    if let Some(limit) = limit {
        query = query.with_limit(limit);
    }

    let mut pipeline = MapPipeline::new(Resolver::from_config(config), config);
    let report = pipeline
        .run(&source, &query)
        .await
        .context("Map run failed")?;
    report.log_summary();

    println!(
        "{} events, {} on the map, {} unresolved",
        report.total,
        report.map_records,
        report.unresolved.len()
    );
    Ok(())
}

async fn run_listing(config: &TomlConfig, events: Option<PathBuf>) -> Result<()> {
    let source = events_source(config, events);
    let output = config.listing_path();
    let count = build_listing(&source, &EventQuery::upcoming(today()), &output)
        .await
        .context("Listing run failed")?;

    println!("{} upcoming concerts saved to {}", count, output.display());
    Ok(())
}

fn open_overrides(path: &Path) -> Result<OverrideStore> {
    if path.exists() {
        Ok(OverrideStore::load(path)?)
    } else {
        Ok(OverrideStore::from_file(OverrideFile::with_comments()))
    }
}

fn run_override(config: &TomlConfig, action: OverrideCommand) -> Result<()> {
    let path = config.overrides_path();
    let geocoding = &config.geocoding;

    match action {
        OverrideCommand::Add { name, lat, lng, note } => {
            validate_position(lat, lng)?;
            let mut store = open_overrides(&path)?;
            let entry = manual_entry(
                &name,
                lat,
                lng,
                note.as_deref().unwrap_or(""),
                &geocoding.primary_region,
                &geocoding.country,
                today(),
            );
            let key = store.add_override(&name, entry);
            store.save(&path)?;

            info!(venue = %name, key = %key, "Manual override saved");
            println!("Saved {} -> {}, {} in {}", name, lat, lng, path.display());
        }
        OverrideCommand::Search { name, locality } => {
            let locality = locality.unwrap_or_default();
            let store = OverrideStore::load_or_empty(&path);

            if let Some(existing) = store.lookup(&name) {
                println!(
                    "Already overridden: {}, {} ({})",
                    existing.lat(),
                    existing.lng(),
                    existing.display_name()
                );
            }
            match search_url(&name, &locality, &geocoding.primary_region) {
                Some(url) => {
                    println!("Open: {}", url);
                    println!("Right-click the venue pin to copy its coordinates, then run:");
                    println!("  gigmap override add \"{}\" <lat> <lng>", name);
                }
                None => bail!("Could not build a search link for {}", name),
            }
        }
        OverrideCommand::Flag { pattern, note } => {
            let mut store = open_overrides(&path)?;
            let id = store.flag_incorrect(&pattern, note.as_deref().unwrap_or(""), today());
            store.save(&path)?;

            info!(pattern = %pattern, id = %id, "Known-incorrect flag recorded");
            println!("Flagged {} ({}); matching events re-resolve on the next map run", pattern, id);
        }
    }
    Ok(())
}

fn init_config(explicit: Option<PathBuf>, force: bool) -> Result<()> {
    let Some(path) = explicit.or_else(default_config_path) else {
        bail!("No config directory available; pass --config <path>");
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }

    write_toml_config(&TomlConfig::default(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
