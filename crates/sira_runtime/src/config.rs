use crate::cache::CacheConfig;
use crate::errors::{SiraError, SiraResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the recommendation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// CSV file holding one row of features per student
    pub data_path: PathBuf,
    pub cache: CacheConfig,
    pub default_top_k: usize,
    /// Default `tracing` filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            data_path: PathBuf::from("data/sample_data.csv"),
            cache: CacheConfig::default(),
            default_top_k: 5,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> SiraResult<()> {
        if self.cache.ttl_seconds == 0 {
            return Err(SiraError::config_error("cache TTL must be greater than zero"));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(SiraError::config_error("data path must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(config.default_top_k, 5);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = ServiceConfig::default();
        config.cache.ttl_seconds = 0;
        assert_eq!(config.validate().unwrap_err().code, ErrorCode::ConfigError);
    }
}
