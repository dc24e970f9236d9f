//! FTMS dashboard main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use ftms_api::start_server;
use ftms_config::{Config, ConfigError};
use ftms_core::{backend, Dashboard};

const DEFAULT_CONFIG: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(name = "ftms")]
#[command(version = "0.1.0")]
#[command(about = "Finance dashboard: searchable, filterable and paginated list views over a REST backend", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Print the default configuration file and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Load the config file; `None` when the default file is absent
fn load_config(args: &Args) -> anyhow::Result<Option<Config>> {
    match Config::load(args.config.clone()) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::FileNotFound { .. }) if args.config == PathBuf::from(DEFAULT_CONFIG) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to load configuration from {}", args.config.display())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let loaded = load_config(&args)?;

    // RUST_LOG overrides the configured level
    let level = loaded.as_ref().map_or("info", |c| c.logging.level.as_str());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match loaded {
        Some(config) => config,
        None => {
            log::warn!("Config file {} not found, using defaults", DEFAULT_CONFIG);
            Config::default()
        }
    };
    log::info!(
        "Config loaded: backend={:?}, page size={}, listening on {}:{}",
        config.backend.kind,
        config.pagination.records_per_page,
        config.server.host,
        config.server.port
    );

    let backend = backend::from_config(&config.backend).context("Failed to create backend")?;
    log::info!("Using {} backend", backend.name());
    let dashboard = Arc::new(Dashboard::new(backend, &config.pagination));

    let report = dashboard.refresh_all().await;
    for (resource, count) in &report.loaded {
        log::info!("Loaded {} {}", count, resource.title());
    }
    for (resource, error) in &report.failed {
        log::warn!("Failed to load {}: {} (the view will show a retry action)", resource.title(), error);
    }

    start_server(config, dashboard).await.context("Server error")?;
    Ok(())
}
