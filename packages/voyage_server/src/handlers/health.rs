use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::AppState;
use crate::metrics;

/// Host platform as reported by the running binary
#[derive(Debug, Clone, Serialize)]
pub struct ArchitectureInfo {
    pub architecture: &'static str,
    pub system: &'static str,
    pub family: &'static str,
}

impl ArchitectureInfo {
    pub fn current() -> Self {
        Self {
            architecture: std::env::consts::ARCH,
            system: std::env::consts::OS,
            family: std::env::consts::FAMILY,
        }
    }
}

/// Banner endpoint - confirms the API is up and which platform serves it
pub async fn root_handler() -> impl IntoResponse {
    let info = ArchitectureInfo::current();
    Json(serde_json::json!({
        "status": "healthy",
        "architecture": info.architecture,
        "system": info.system,
        "message": "Voyage hub is running",
    }))
}

pub async fn architecture_handler() -> impl IntoResponse {
    Json(ArchitectureInfo::current())
}

/// Health check endpoint - returns server status
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.snapshot();

    let status = if metrics.errors.websocket == 0 {
        "healthy"
    } else {
        "degraded"
    };

    Json(metrics::HealthStatus {
        status: status.to_string(),
        voyages: state.hub.room_count().await,
        connections: metrics.connections.active,
        uptime_secs: metrics.uptime_secs,
    })
}

/// Metrics endpoint - returns detailed server metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Liveness probe - returns 200 if the server is running
pub async fn health_live_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/architecture", get(architecture_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(health_live_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(crate::test_helpers::test_app_state())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (status, json) = get_json(test_router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["architecture"], std::env::consts::ARCH);
        assert_eq!(json["system"], std::env::consts::OS);
    }

    #[tokio::test]
    async fn test_architecture() {
        let (status, json) = get_json(test_router(), "/architecture").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["family"], std::env::consts::FAMILY);
    }

    #[tokio::test]
    async fn test_health_counts_voyages() {
        let state = crate::test_helpers::test_app_state();
        let conn = crate::test_helpers::detached_connection();
        state.hub.admit(&conn, "space", "Captain").await.unwrap();

        let app = Router::new()
            .route("/health", get(health_handler))
            .with_state(state);
        let (status, json) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["voyages"], 1);
        assert_eq!(json["connections"], 0);
    }

    #[tokio::test]
    async fn test_live_and_metrics() {
        let (status, json) = get_json(test_router(), "/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "alive");

        let (status, json) = get_json(test_router(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["connections"]["active"], 0);
        assert_eq!(json["messages"]["broadcasts"], 0);
    }
}
