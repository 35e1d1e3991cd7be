//! Slitherd - Slither analysis as an HTTP service
//!
//! Accepts Solidity contract source (directly, or as a GitHub repository
//! reference), runs it through the external `slither` analyzer, and
//! returns normalized findings.
//!
//! Exit codes:
//!   0 - Clean shutdown
//!   1 - Runtime error (bind failure, bad config, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod repo;
mod scanner;
mod server;
mod slither;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("slitherd v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Run the server
    if let Err(e) = server::run(config).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .slitherd.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".slitherd.toml");

    if path.exists() {
        eprintln!(".slitherd.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .slitherd.toml")?;

    println!("Created .slitherd.toml with default settings.");
    println!("Edit it to customize the analyzer binary, timeouts, and scan limits.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .slitherd.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
