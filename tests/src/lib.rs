//! Helpers for end-to-end tests of the SIRA service.
//! Builds the real router over the real cache and vector stores.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use gateway::AppState;
use sira_runtime::{Entity, RecommendationEngine, DEFAULT_CACHE_TTL};
use state_store::StateStore;
use std::sync::Arc;
use std::time::Duration;
use telemetry::TelemetrySystem;
use tower::ServiceExt;
use vec_cache::{CsvVectorStore, MemoryVectorStore};

/// Router plus the handles a test wants to inspect afterwards
pub struct TestService {
    pub router: Router,
    pub cache: Arc<StateStore>,
    pub telemetry: Arc<TelemetrySystem>,
}

impl TestService {
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self::build(Arc::new(MemoryVectorStore::new(entities)), DEFAULT_CACHE_TTL)
    }

    pub fn from_csv(store: CsvVectorStore, ttl: Duration) -> Self {
        Self::build(Arc::new(store), ttl)
    }

    fn build(source: Arc<dyn sira_runtime::VectorSource>, ttl: Duration) -> Self {
        let cache = Arc::new(StateStore::new());
        let telemetry = Arc::new(TelemetrySystem::new());
        let engine = Arc::new(RecommendationEngine::new(source, cache.clone(), ttl));
        let router = gateway::create_router(AppState::new(engine, telemetry.clone(), 5));
        Self {
            router,
            cache,
            telemetry,
        }
    }

    /// Sends one request and returns the status and parsed JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    pub async fn recommend(&self, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.send(Method::POST, "/recommend", Some(body)).await
    }
}

pub fn scenario_entities() -> Vec<Entity> {
    vec![
        Entity::new(1, vec![1.0, 0.0]),
        Entity::new(2, vec![0.0, 1.0]),
        Entity::new(3, vec![1.0, 0.0]),
    ]
}
