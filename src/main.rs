use anyhow::Context;
use clap::Parser;
use gateway::AppState;
use sira_runtime::{CacheConfig, RecommendationEngine, ServiceConfig};
use state_store::StateStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use telemetry::TelemetrySystem;
use tracing::{debug, error, info, warn};
use vec_cache::CsvVectorStore;

/// SIRA student recommendation service
#[derive(Debug, Parser)]
#[command(name = "sira", version, about)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "SIRA_BIND_ADDR")]
    bind: Option<SocketAddr>,

    /// CSV file with a `student_id` column and numeric feature columns
    #[arg(long, env = "SIRA_DATA_PATH")]
    data: Option<PathBuf>,

    /// Seconds a computed recommendation stays cached
    #[arg(long, env = "SIRA_CACHE_TTL")]
    cache_ttl: Option<u64>,

    /// top_k used when a request omits it
    #[arg(long, env = "SIRA_DEFAULT_TOP_K")]
    top_k: Option<usize>,

    /// Default tracing filter (RUST_LOG overrides)
    #[arg(long, env = "SIRA_LOG")]
    log: Option<String>,
}

impl Cli {
    fn into_config(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            bind_addr: self.bind.unwrap_or(defaults.bind_addr),
            data_path: self.data.unwrap_or(defaults.data_path),
            cache: self
                .cache_ttl
                .map(|ttl_seconds| CacheConfig { ttl_seconds })
                .unwrap_or(defaults.cache),
            default_top_k: self.top_k.unwrap_or(defaults.default_top_k),
            log_filter: self.log.unwrap_or(defaults.log_filter),
        }
    }
}

/// Evicts expired entries that were never read again and reports the cache size.
fn spawn_cache_purge(cache: Arc<StateStore>, telemetry: Arc<TelemetrySystem>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.purge_expired().await;
            if removed > 0 {
                debug!("Purged {} expired cache entries", removed);
            }
            telemetry.record_gauge(telemetry::CACHE_ENTRIES, cache.len().await as f64);
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();
    telemetry::init_tracing(&config.log_filter)?;
    config.validate()?;

    info!("Starting SIRA recommendation service...");
    info!(
        "Vector data: {}, cache TTL: {}s, default top_k: {}",
        config.data_path.display(),
        config.cache.ttl_seconds,
        config.default_top_k
    );
    match tokio::fs::try_exists(&config.data_path).await {
        Ok(true) => {}
        Ok(false) => error!(
            "Vector data file {} does not exist yet; requests will fail until it does",
            config.data_path.display()
        ),
        Err(e) => warn!(
            "Could not check vector data file {}: {}",
            config.data_path.display(),
            e
        ),
    }

    let source = Arc::new(CsvVectorStore::new(config.data_path.clone()));
    let cache = Arc::new(StateStore::new());
    let engine = Arc::new(RecommendationEngine::new(source, cache.clone(), config.cache.ttl()));
    let telemetry = Arc::new(TelemetrySystem::new());
    spawn_cache_purge(cache, telemetry.clone(), config.cache.ttl());
    let state = AppState::new(engine, telemetry, config.default_top_k);

    gateway::serve(config.bind_addr, state)
        .await
        .with_context(|| format!("Failed to serve on {}", config.bind_addr))?;

    info!("SIRA recommendation service shutdown complete");
    Ok(())
}
