//! Catalog Server CLI
//!
//! # Usage
//!
//! ```bash
//! # Serve with defaults (sqlite://metadata.db on 0.0.0.0:8000)
//! cargo run --bin catalog-server -- serve
//!
//! # Serve from a config file on another port
//! cargo run --bin catalog-server -- serve --config catalog.yaml --bind 127.0.0.1:9000
//!
//! # Print the effective configuration
//! cargo run --bin catalog-server -- check-config --config catalog.yaml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use catalog_service::http::{self, AppState};
use catalog_service::{open_repository, Catalog, CatalogConfig, Validatable};

#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(about = "Metadata catalog with cycle-safe dataset lineage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides bind_addr
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Load, validate and print the effective configuration
    CheckConfig {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut config = CatalogConfig::load(config.as_deref())
                .context("failed to load configuration")?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
                config.validate().context("invalid --bind address")?;
            }
            init_tracing(&config);
            serve(config).await
        }
        Commands::CheckConfig { config } => {
            let config = CatalogConfig::load(config.as_deref())
                .context("failed to load configuration")?;
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the configured level
///
/// Production logs drop ANSI colors and include the event target.
fn init_tracing(config: &CatalogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()));
    let production = config.is_production();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!production)
        .with_target(production)
        .init();
}

async fn serve(config: CatalogConfig) -> anyhow::Result<()> {
    let target = config.database_target()?;
    let repo = open_repository(&target).context("failed to open catalog store")?;

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        app = %config.app_name,
        environment = %config.environment,
        addr = %listener.local_addr()?,
        prefix = %config.api_prefix,
        "Catalog server starting"
    );

    let app_name = config.app_name.clone();
    let state = AppState::new(Catalog::new(repo), Arc::new(config));
    http::serve(listener, state, shutdown_signal()).await?;

    info!(app = %app_name, "Catalog server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
    }
    info!("Shutdown requested, draining connections");
}
