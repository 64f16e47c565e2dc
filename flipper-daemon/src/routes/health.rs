//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use flipper_services::HealthReport;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    report: Option<HealthReport>,
}

/// 200 once a bazaar snapshot is published, 503 before that
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let Some(services) = state.orchestrator.services() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "initializing",
                report: None,
            }),
        );
    };

    let report = services.health.sample();
    let (code, status) = if report.healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            report: Some(report),
        }),
    )
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
