//! CPDD - Command-line access to the dataset
//!
//! Expands configuration queries, decodes storage keys and fetches capture
//! files into the local download location.

mod query;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cpdd_core::{Configuration, Modality};
use cpdd_data::{load_settings, Dataset};

use crate::query::QueryArgs;

#[derive(Parser, Debug)]
#[command(name = "cpdd")]
#[command(about = "Query and download CPDD captures")]
#[command(version)]
struct Args {
    /// Path to settings file
    #[arg(short, long, default_value = "cpdd.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the storage keys matching a query
    Expand {
        #[command(flatten)]
        query: QueryArgs,

        /// Print configurations as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a storage key into its configuration
    Decode {
        key: String,
    },
    /// Show download state of every modality of a capture
    Status {
        key: String,
    },
    /// Download the captures matching a query
    Download {
        #[command(flatten)]
        query: QueryArgs,

        /// Modalities to fetch (default: all)
        #[arg(short, long)]
        modality: Vec<Modality>,

        /// Fetch again even when already downloaded
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("cpdd v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Expand { query, json } => {
            let configs = query.to_partial()?.expand();
            if json {
                println!("{}", serde_json::to_string_pretty(&configs)?);
            } else {
                for config in &configs {
                    println!("{}", config.storage_key());
                }
            }
        }
        Command::Decode { key } => {
            let config: Configuration = key
                .parse()
                .with_context(|| format!("Failed to decode {:?}", key))?;
            println!("{}", config);
        }
        Command::Status { key } => {
            let config: Configuration = key
                .parse()
                .with_context(|| format!("Failed to decode {:?}", key))?;
            let dataset = open_dataset(&args.config)?;

            println!("{}", config);
            println!("  location: {}", dataset.location().root().display());
            for modality in Modality::ALL {
                let file = dataset.file(config, modality);
                let remote = match file.remote_exists() {
                    Ok(true) => "yes".to_string(),
                    Ok(false) => "no".to_string(),
                    Err(e) => {
                        warn!(key = %file.remote_key(), error = %e, "Remote probe failed");
                        "unknown".to_string()
                    }
                };
                println!(
                    "  {:<12} downloaded: {:<5} remote: {}",
                    modality,
                    file.is_downloaded(),
                    remote
                );
            }
        }
        Command::Download {
            query,
            modality,
            force,
        } => {
            let configs = query.to_partial()?.expand();
            let modalities = if modality.is_empty() {
                Modality::ALL.to_vec()
            } else {
                modality
            };
            let dataset = open_dataset(&args.config)?;

            info!(
                captures = configs.len(),
                modalities = modalities.len(),
                force,
                "Starting download"
            );

            for config in &configs {
                for modality in &modalities {
                    let file = dataset.file(*config, *modality);
                    file.download(force)
                        .with_context(|| format!("Failed to download {}", file.remote_location()))?;
                    println!("{}", file.download_file().display());
                }
            }
        }
    }

    Ok(())
}

fn open_dataset(settings_path: &std::path::Path) -> Result<Dataset> {
    let settings = load_settings(settings_path)?;
    let dataset = Dataset::from_settings(&settings).context("Failed to set up remote storage")?;
    Ok(dataset)
}
