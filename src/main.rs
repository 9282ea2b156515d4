mod api;
mod config;
mod countries;
mod models;
mod rate_limit;
mod stats;
mod storage;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use config::{BackendKind, Config};
use countries::CountryIndex;
use rate_limit::RateLimiter;
use stats::VisitStats;
use storage::{CachedBackend, KvBackend, MemoryBackend, RedisBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize the key-value backend
    let mut backend: Arc<dyn KvBackend> = match config.backend.kind {
        BackendKind::Redis => {
            info!("Using Redis backend: {}", config.backend.redis_url);
            Arc::new(RedisBackend::connect(&config.backend).await?)
        }
        BackendKind::Memory => {
            info!("Using in-memory backend (counters reset on restart)");
            Arc::new(MemoryBackend::new())
        }
    };

    if config.cache.enabled {
        info!("📦 Read cache enabled (ttl: {}s)", config.cache.ttl_secs);
        backend = Arc::new(CachedBackend::new(
            Arc::clone(&backend),
            config.cache.ttl_secs,
        ));
    }

    // Build the domain services
    let countries = Arc::new(CountryIndex::new());
    info!("Loaded {} country codes", countries.len());
    let store = Arc::new(VisitStats::new(Arc::clone(&backend), Arc::clone(&countries)));

    // Rate limiter with a periodic purge of idle windows
    let rate_limiter = if config.rate_limit.enabled {
        info!(
            "🚦 Rate limiting enabled ({} requests / {}s per client)",
            config.rate_limit.max_requests, config.rate_limit.window_secs
        );
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        let purge = Arc::clone(&limiter);
        let period = Duration::from_secs(config.rate_limit.window_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                purge.purge_expired();
            }
        });

        Some(limiter)
    } else {
        info!("🚦 Rate limiting is disabled");
        None
    };

    // Create the router
    let router = api::create_api_router(store, countries, backend, rate_limiter);

    // Start the API server
    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Visit stats server listening on http://{}", addr);
    info!("   - API endpoints available at http://{}/api/...", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}
