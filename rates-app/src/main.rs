//! # Rates Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter and object cache
//! - Create the reference service
//! - Start the HTTP server

mod config;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rates_hex::{CachePolicy, DefaultService, ReferenceService, inbound::HttpServer};
use rates_repo::{MemoryCache, build_repo};
use rates_types::Currency;

use config::{Config, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rates_app=debug,rates_hex=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Starting rates server on {}", config.bind_addr());
    tracing::debug!(
        max_connections = config.db_max_connections,
        currency_ttl_secs = config.currency_ttl.as_secs(),
        object_ttl_secs = config.object_ttl.as_secs(),
        "Loaded configuration"
    );

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url, config.db_max_connections).await?;

    let policy = CachePolicy::new(config.object_ttl).with_ttl_for::<Currency>(config.currency_ttl);
    let service: DefaultService = ReferenceService::with_policy(repo, MemoryCache::new(), policy);

    // Create and run the HTTP server
    let server = HttpServer::new(service);
    server.run(&config.bind_addr()).await?;

    Ok(())
}
