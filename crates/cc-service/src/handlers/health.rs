//! Health and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::ReadinessResponse;
use crate::routes::AppState;

/// Liveness probe. Returns 200 as long as the process is serving requests.
pub async fn health() -> &'static str {
    "OK"
}

/// Readiness probe. Verifies database connectivity.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                database: Some("connected"),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "cc.handlers.health", error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    database: Some("unavailable"),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
