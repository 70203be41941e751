/*!
# State Store

In-memory key-value store with time-to-live expiry. Backs the recommendation
result cache.
*/

use async_trait::async_trait;
use sira_runtime::{ResultCache, SiraResult};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct StateStore {
    memory: RwLock<HashMap<String, Entry>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        {
            let memory = self.memory.read().await;
            match memory.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: drop it unless a writer refreshed it in between
        let mut memory = self.memory.write().await;
        if memory.get(key).is_some_and(|e| e.is_expired(now)) {
            memory.remove(key);
            debug!("Evicted expired key {}", key);
        }
        None
    }

    pub async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.memory.write().await.insert(key.to_string(), entry);
    }


    pub async fn delete_prefix(&self, prefix: &str) -> usize {
        let mut memory = self.memory.write().await;
        let before = memory.len();
        memory.retain(|k, _| !k.starts_with(prefix));
        before - memory.len()
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut memory = self.memory.write().await;
        let before = memory.len();
        memory.retain(|_, e| !e.is_expired(now));
        before - memory.len()
    }

    pub async fn len(&self) -> usize {
        self.memory.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.memory.read().await.is_empty()
    }
}

#[async_trait]
impl ResultCache for StateStore {
    async fn get(&self, key: &str) -> SiraResult<Option<serde_json::Value>> {
        Ok(StateStore::get(self, key).await)
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> SiraResult<()> {
        StateStore::set(self, key, value, ttl).await;
        Ok(())
    }


    async fn delete_prefix(&self, prefix: &str) -> SiraResult<usize> {
        Ok(StateStore::delete_prefix(self, prefix).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_then_get() {
        let store = StateStore::new();
        store.set("rec_1_k5", json!({"student_id": 1}), HOUR).await;

        assert_eq!(store.get("rec_1_k5").await, Some(json!({"student_id": 1})));
        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = StateStore::new();
        store.set("short", json!(1), Duration::from_millis(20)).await;
        store.set("long", json!(2), HOUR).await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get("short").await, None);
        assert_eq!(store.get("long").await, Some(json!(2)));
        // the expired read evicted the entry
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_immediately_expired() {
        let store = StateStore::new();
        store.set("k", json!(true), Duration::ZERO).await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_value() {
        let store = StateStore::new();
        store.set("k", json!("old"), HOUR).await;
        store.set("k", json!("new"), HOUR).await;
        assert_eq!(store.get("k").await, Some(json!("new")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired() {
        let store = StateStore::new();
        store.set("a", json!(1), Duration::from_millis(10)).await;
        store.set("b", json!(2), HOUR).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("b").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let store = StateStore::new();
        for key in ["rec_1_k5", "rec_1_k2", "rec_12_k5", "other"] {
            store.set(key, json!(key), HOUR).await;
        }

        assert_eq!(store.delete_prefix("rec_1_").await, 2);
        assert!(store.get("rec_12_k5").await.is_some());
        assert!(store.get("other").await.is_some());
        assert_eq!(store.delete_prefix("rec_").await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_usable_as_result_cache() {
        let cache: std::sync::Arc<dyn ResultCache> = std::sync::Arc::new(StateStore::new());
        cache.set("rec_3_k1", json!({"ok": true}), HOUR).await.unwrap();
        assert_eq!(cache.get("rec_3_k1").await.unwrap(), Some(json!({"ok": true})));
        assert_eq!(cache.delete_prefix("rec_").await.unwrap(), 1);
    }
}
