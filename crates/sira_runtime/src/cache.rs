use crate::errors::SiraResult;
use crate::types::StudentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time-to-live applied to cached recommendations unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Key-value store with per-entry expiry holding JSON documents.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns the value if present and not expired.
    async fn get(&self, key: &str) -> SiraResult<Option<serde_json::Value>>;

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> SiraResult<()>;

    /// Removes every entry whose key starts with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> SiraResult<usize>;
}

const KEY_PREFIX: &str = "rec_";

/// Cache key for one (student, top_k) query.
pub fn recommendation_key(student_id: StudentId, top_k: usize) -> String {
    format!("{}k{}", student_prefix(student_id), top_k)
}

/// Prefix shared by every cached recommendation of `student_id`.
pub fn student_prefix(student_id: StudentId) -> String {
    format!("{}{}_", KEY_PREFIX, student_id)
}

/// Prefix shared by every cached recommendation.
pub fn all_recommendations_prefix() -> &'static str {
    KEY_PREFIX
}
