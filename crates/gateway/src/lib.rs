/*!
# Gateway

HTTP surface of the SIRA service. Translates JSON requests into
[`RecommendationEngine`] calls and reports outcomes to telemetry.
*/

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use sira_runtime::{
    CacheStatus, RecommendationEngine, RecommendationResponse, SiraError, StudentId,
    StudentRequest,
};
use std::net::SocketAddr;
use std::sync::Arc;
use telemetry::TelemetrySystem;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Liveness message returned by `GET /`
pub const ROOT_MESSAGE: &str = "SIRA AI Service Running ✓";

/// Payload for a student that is not in the vector store
pub const NOT_FOUND_MESSAGE: &str = "Student not found";

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub telemetry: Arc<TelemetrySystem>,
    pub default_top_k: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<RecommendationEngine>,
        telemetry: Arc<TelemetrySystem>,
        default_top_k: usize,
    ) -> Self {
        Self {
            engine,
            telemetry,
            default_top_k,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct InvalidationBody {
    pub invalidated: usize,
}

/// Failures mapped onto HTTP responses, always with a JSON `{"error": ...}` body
#[derive(Debug)]
pub enum ApiError {
    Engine(SiraError),
    /// Request body that could not be read as the expected JSON
    BadRequest { status: StatusCode, message: String },
}

impl From<SiraError> for ApiError {
    fn from(err: SiraError) -> Self {
        Self::Engine(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Engine(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string())
            }
            Self::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.message),
            Self::BadRequest { status, message } => (status, message),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Create router for the service endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/recommend", post(handle_recommend))
        .route("/cache", delete(handle_invalidate_all))
        .route("/cache/:student_id", delete(handle_invalidate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("SIRA gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": ROOT_MESSAGE }))
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut health = state.telemetry.health_check().await?;
    health["cache_hit_rate"] = serde_json::json!(state.telemetry.cache_hit_rate());
    health["cache_ttl_seconds"] = serde_json::json!(state.engine.ttl().as_secs());
    Ok(Json(health))
}

async fn handle_metrics(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.telemetry.get_metrics()))
}

async fn handle_recommend(
    State(state): State<AppState>,
    payload: Result<Json<StudentRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    state.telemetry.increment(telemetry::REQUESTS_TOTAL);
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected recommendation request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    let top_k = request.top_k_or(state.default_top_k);

    match state
        .engine
        .recommend_with_status(request.student_id, top_k)
        .await
    {
        Ok((response, status)) => {
            state.telemetry.increment(match status {
                CacheStatus::Hit => telemetry::CACHE_HITS,
                CacheStatus::Miss => telemetry::CACHE_MISSES,
            });
            Ok(Json(response))
        }
        Err(e) if e.is_not_found() => {
            state.telemetry.increment(telemetry::NOT_FOUND);
            Err(e.into())
        }
        Err(e) => {
            error!(student_id = request.student_id, "Recommendation failed: {}", e);
            state.telemetry.increment(telemetry::ERRORS);
            Err(e.into())
        }
    }
}

async fn handle_invalidate(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<InvalidationBody>, ApiError> {
    let invalidated = state.engine.invalidate(student_id).await?;
    state.telemetry.increment(telemetry::INVALIDATIONS);
    Ok(Json(InvalidationBody { invalidated }))
}

async fn handle_invalidate_all(
    State(state): State<AppState>,
) -> Result<Json<InvalidationBody>, ApiError> {
    let invalidated = state.engine.invalidate_all().await?;
    state.telemetry.increment(telemetry::INVALIDATIONS);
    Ok(Json(InvalidationBody { invalidated }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use sira_runtime::{Entity, ResultCache, SiraResult, StudentTable, VectorSource};
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    struct FixedSource(Vec<Entity>);

    #[async_trait]
    impl VectorSource for FixedSource {
        async fn load(&self) -> SiraResult<StudentTable> {
            StudentTable::new(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MapCache(Mutex<HashMap<String, serde_json::Value>>);

    #[async_trait]
    impl ResultCache for MapCache {
        async fn get(&self, key: &str) -> SiraResult<Option<serde_json::Value>> {
            Ok(self.0.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: serde_json::Value, _ttl: Duration) -> SiraResult<()> {
            self.0.lock().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete_prefix(&self, prefix: &str) -> SiraResult<usize> {
            let mut map = self.0.lock().await;
            let before = map.len();
            map.retain(|k, _| !k.starts_with(prefix));
            Ok(before - map.len())
        }
    }

    fn state(entities: Vec<Entity>) -> AppState {
        let engine = RecommendationEngine::new(
            Arc::new(FixedSource(entities)),
            Arc::new(MapCache::default()),
            Duration::from_secs(3600),
        );
        AppState::new(Arc::new(engine), Arc::new(TelemetrySystem::new()), 5)
    }

    #[tokio::test]
    async fn test_recommend_handler_counts_hits_and_misses() {
        let state = state(vec![
            Entity::new(1, vec![1.0, 0.0]),
            Entity::new(2, vec![0.0, 1.0]),
        ]);
        let request = || StudentRequest { student_id: 1, top_k: None };

        let Json(first) = handle_recommend(State(state.clone()), Ok(Json(request())))
            .await
            .unwrap();
        let Json(second) = handle_recommend(State(state.clone()), Ok(Json(request())))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(state.telemetry.get_metric(telemetry::REQUESTS_TOTAL), 2.0);
        assert_eq!(state.telemetry.get_metric(telemetry::CACHE_MISSES), 1.0);
        assert_eq!(state.telemetry.get_metric(telemetry::CACHE_HITS), 1.0);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let state = state(vec![Entity::new(1, vec![1.0])]);
        let request = StudentRequest { student_id: 5, top_k: Some(3) };

        let response = match handle_recommend(State(state.clone()), Ok(Json(request))).await {
            Ok(_) => panic!("expected an error"),
            Err(e) => e.into_response(),
        };
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.telemetry.get_metric(telemetry::NOT_FOUND), 1.0);
    }

    #[test]
    fn test_data_errors_map_to_500() {
        let response = ApiError::from(SiraError::dimension_mismatch(2, 3)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let app = create_router(state(vec![Entity::new(1, vec![1.0])]));
        let cases = [
            ("application/json", "{\"student_id\": \"one\"}"),
            ("application/json", "{not json"),
            ("text/plain", "{\"student_id\": 1}"),
        ];

        for (content_type, body) in cases {
            let response = app
                .clone()
                .oneshot(
                    Request::post("/recommend")
                        .header(header::CONTENT_TYPE, content_type)
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert!(response.status().is_client_error(), "{} -> {}", body, response.status());
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json",
                "{}",
                body
            );
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(json["error"].is_string(), "{}", json);
        }
    }
}
