//! Route table and shared application state.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{chat, health, meetings, tenants};
use crate::middleware::http_metrics::track_http_metrics;
use crate::services::auth_provider::AuthProviderClient;
use crate::services::video_provider::VideoProviderClient;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub video_provider: Arc<dyn VideoProviderClient>,
    pub auth_provider: Arc<dyn AuthProviderClient>,
}

/// Build the service router.
///
/// Layer order matters: the metrics middleware is outermost so it observes
/// every response, including timeouts and unrouted 404s.
pub fn build_routes(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let api = Router::new()
        .route("/api/tenants", post(tenants::create_tenant))
        .route(
            "/api/tenants/domain/:domain",
            get(tenants::get_tenant_by_domain),
        )
        .route(
            "/api/tenants/:tenant_id",
            get(tenants::get_tenant)
                .put(tenants::update_tenant)
                .delete(tenants::delete_tenant),
        )
        .route(
            "/api/tenants/:tenant_id/users",
            post(tenants::create_user).get(tenants::list_users),
        )
        .route(
            "/api/tenants/:tenant_id/users/:user_id",
            get(tenants::get_user),
        )
        .route(
            "/api/tenants/:tenant_id/meetings",
            post(meetings::create_meeting).get(meetings::list_meetings),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id",
            get(meetings::get_meeting),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id/join",
            post(meetings::join_meeting),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id/leave",
            post(meetings::leave_meeting),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id/end",
            post(meetings::end_meeting),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id/cancel",
            post(meetings::cancel_meeting),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id/participants",
            get(meetings::list_participants),
        )
        .route(
            "/api/tenants/:tenant_id/meetings/:meeting_id/messages",
            post(chat::post_message).get(chat::list_messages),
        );

    let operational = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/metrics",
            get(move || async move { metrics_handle.render() }),
        );

    Router::new()
        .merge(api)
        .merge(operational)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(track_http_metrics))
        .with_state(state)
}
