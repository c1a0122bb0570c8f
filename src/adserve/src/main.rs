//! adserve — ad slot delivery service for the artist/venue marketplace.
//!
//! Main entry point that wires the backend store, delivery engine, and
//! trackers, then starts the HTTP server.

use adserve_api::{ApiServer, AppState};
use adserve_core::config::AppConfig;
use adserve_core::{Clock, SystemClock};
use adserve_delivery::{DeliveryEngine, EligibilityPolicy};
use adserve_store::{AdStore, MemoryStore, RestStore, SettingsCache};
use adserve_tracking::{ClickTracker, ImpressionTracker};
use clap::Parser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adserve")]
#[command(about = "Ad slot delivery service: eligibility, weighted selection, tracking")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "ADSERVE__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "ADSERVE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Store backend: memory or rest (overrides config)
    #[arg(long, env = "ADSERVE__STORE__BACKEND")]
    store: Option<String>,

    /// Seed the memory store with a demo slot and campaigns
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adserve=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("adserve starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(store) = cli.store {
        config.store.backend = store;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        store = %config.store.backend,
        "Configuration loaded"
    );

    // Backend store
    let store: Arc<dyn AdStore> = match config.store.backend.as_str() {
        "rest" => Arc::new(RestStore::new(&config.store)?),
        "memory" => {
            let memory = MemoryStore::new();
            if cli.seed_demo {
                memory.seed_demo();
            }
            Arc::new(memory)
        }
        other => anyhow::bail!("unknown store backend: {other}"),
    };
    info!(backend = store.backend_tag(), "Store initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let settings = Arc::new(SettingsCache::new(
        store.clone(),
        clock.clone(),
        config.tracking.settings_cache_ttl_ms,
    ));

    let engine = Arc::new(DeliveryEngine::new(
        store.clone(),
        settings.clone(),
        clock.clone(),
        EligibilityPolicy::from(&config.delivery),
        Duration::from_millis(config.store.fetch_timeout_ms),
    ));

    let impressions = Arc::new(ImpressionTracker::new(
        store.clone(),
        clock.clone(),
        config.tracking.session_ttl_secs,
    ));

    let clicks = Arc::new(ClickTracker::new(
        store,
        settings,
        clock,
        config.tracking.utm_source.clone(),
    ));

    let state = AppState {
        engine,
        impressions,
        clicks,
        node_id: config.node_id.clone(),
        start_time: Instant::now(),
    };

    let server = ApiServer::new(config, state);
    server.start_metrics().await?;
    server.start_http().await
}
