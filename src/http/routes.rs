//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::room::RoomInfo;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS: explicit origins from CLIENT_ORIGIN, any origin when unset
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origins
        .iter()
        .filter_map(|s| s.parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = if allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed_origins)
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/rooms/:room_id", get(room_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    rooms: usize,
    peers: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        rooms: state.rooms.room_count(),
        peers: state.rooms.peer_count(),
    })
}

// ============================================================================
// Room endpoint
// ============================================================================

async fn room_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomInfo>, AppError> {
    state
        .rooms
        .room_info(&room_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("room {room_id}")))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let message = self.to_string();

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::room::PeerHandle;

    fn state() -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState::new(config)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_counts_rooms_and_peers() {
        let state = state();
        let (tx, _rx) = mpsc::channel(4);
        state
            .rooms
            .join(PeerHandle::new(Uuid::new_v4(), tx), "abc123", None)
            .unwrap();

        let (status, body) = get_json(build_router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rooms"], 1);
        assert_eq!(body["peers"], 1);
    }

    #[tokio::test]
    async fn test_room_lookup() {
        let state = state();
        let (tx, _rx) = mpsc::channel(4);
        state
            .rooms
            .join(PeerHandle::new(Uuid::new_v4(), tx), "abc123", None)
            .unwrap();
        let router = build_router(state);

        let (status, body) = get_json(router.clone(), "/rooms/abc123").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_host"], true);
        assert_eq!(body["controllers"], 0);
        assert!(body["last_game"].is_null());

        let (status, body) = get_json(router, "/rooms/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }
}
