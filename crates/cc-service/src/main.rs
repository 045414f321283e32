//! Conference Controller service binary.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cc_service::config::Config;
use cc_service::observability::metrics::init_metrics_recorder;
use cc_service::routes::{build_routes, AppState};
use cc_service::services::auth_provider::{AuthProviderClient, HttpAuthProvider};
use cc_service::services::video_provider::{HttpVideoProvider, VideoProviderClient};
use cc_service::tasks::session_reaper::run_session_reaper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cc_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let metrics_handle =
        init_metrics_recorder().map_err(|e| anyhow::anyhow!("Metrics init failed: {e}"))?;

    let video_provider: Arc<dyn VideoProviderClient> = Arc::new(HttpVideoProvider::new(
        config.video_provider_url.clone(),
        config.video_provider_api_key.clone(),
    ));
    let auth_provider: Arc<dyn AuthProviderClient> =
        Arc::new(HttpAuthProvider::new(config.auth_provider_url.clone()));

    let cancellation_token = CancellationToken::new();
    if config.reaper_interval_seconds > 0 {
        tokio::spawn(run_session_reaper(
            pool.clone(),
            Arc::clone(&video_provider),
            Arc::clone(&auth_provider),
            config.reaper_interval_seconds,
            cancellation_token.clone(),
        ));
    } else {
        tracing::warn!(target: "cc", "Session reaper disabled (REAPER_INTERVAL_SECONDS=0)");
    }

    let bind_address = config.bind_address.clone();
    let state = AppState {
        pool,
        config: Arc::new(config),
        video_provider,
        auth_provider,
    };

    let app = build_routes(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!(target: "cc", address = %bind_address, "Conference Controller listening");

    axum::serve(listener, app).await.context("Server error")?;

    cancellation_token.cancel();
    Ok(())
}
