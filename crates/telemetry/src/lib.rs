/*!
# Telemetry

Metrics and logging for the SIRA service.
Provides tracing setup, request counters and health checks.
*/

use parking_lot::RwLock;
use sira_runtime::{SiraError, SiraResult, RUNTIME_VERSION};
use std::collections::HashMap;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

pub const REQUESTS_TOTAL: &str = "requests_total";
pub const CACHE_HITS: &str = "cache_hits";
pub const CACHE_MISSES: &str = "cache_misses";
pub const NOT_FOUND: &str = "not_found";
pub const ERRORS: &str = "errors";
pub const INVALIDATIONS: &str = "cache_invalidations";
pub const CACHE_ENTRIES: &str = "cache_entries";

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) -> SiraResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| SiraError::config_error(&format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| SiraError::config_error(&format!("Failed to install tracing: {}", e)))
}

pub struct TelemetrySystem {
    metrics: RwLock<HashMap<String, f64>>,
    started_at: Instant,
}

impl Default for TelemetrySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySystem {
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(HashMap::new()),
            started_at: Instant::now(),
        }
    }

    pub fn record_counter(&self, name: &str, value: f64) {
        *self.metrics.write().entry(name.to_string()).or_insert(0.0) += value;
    }

    pub fn increment(&self, name: &str) {
        self.record_counter(name, 1.0);
    }

    pub fn record_gauge(&self, name: &str, value: f64) {
        self.metrics.write().insert(name.to_string(), value);
    }

    pub fn get_metric(&self, name: &str) -> f64 {
        self.metrics.read().get(name).copied().unwrap_or(0.0)
    }

    /// Snapshot of every recorded metric.
    pub fn get_metrics(&self) -> HashMap<String, f64> {
        self.metrics.read().clone()
    }

    /// Cache hits over all answered lookups, or 0 before the first one.
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.get_metric(CACHE_HITS);
        let total = hits + self.get_metric(CACHE_MISSES);
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub async fn health_check(&self) -> SiraResult<serde_json::Value> {
        let metrics = self.metrics.read();
        Ok(serde_json::json!({
            "status": "healthy",
            "version": RUNTIME_VERSION,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": self.uptime_seconds(),
            "metrics_count": metrics.len(),
            "requests_total": metrics.get(REQUESTS_TOTAL).copied().unwrap_or(0.0),
        }))
    }
}
