//! Test server harness for end-to-end testing.
//!
//! Provides `TestCcServer` for spawning real Conference Controller instances
//! in tests, backed by mock provider clients.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use cc_service::config::Config;
use cc_service::routes::{build_routes, AppState};
use cc_service::services::auth_provider::mock::MockAuthProvider;
use cc_service::services::video_provider::mock::MockVideoProvider;

/// Test harness for spawning the Conference Controller in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[sqlx::test(migrations = "../../migrations")]
/// async fn test_health_e2e(pool: PgPool) -> anyhow::Result<()> {
///     let server = TestCcServer::spawn(pool).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestCcServer {
    addr: SocketAddr,
    pool: PgPool,
    video_provider: MockVideoProvider,
    auth_provider: MockAuthProvider,
    _handle: JoinHandle<()>,
}

impl TestCcServer {
    /// Spawn a server on a random port with accepting mock providers.
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn_with_providers(
            pool,
            MockVideoProvider::accepting(),
            MockAuthProvider::accepting(),
        )
        .await
    }

    /// Spawn a server with specific provider mocks (e.g. failure injection).
    pub async fn spawn_with_providers(
        pool: PgPool,
        video_provider: MockVideoProvider,
        auth_provider: MockAuthProvider,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "VIDEO_PROVIDER_URL".to_string(),
                "http://localhost:1".to_string(),
            ),
            (
                "AUTH_PROVIDER_URL".to_string(),
                "http://localhost:1".to_string(),
            ),
        ]);

        let config =
            Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {e}"))?;

        let state = AppState {
            pool: pool.clone(),
            config: Arc::new(config),
            video_provider: Arc::new(video_provider.clone()),
            auth_provider: Arc::new(auth_provider.clone()),
        };

        // A local (non-installed) recorder so multiple servers can coexist
        // within one test binary.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {e}"))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {e}"))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {e}");
            }
        });

        Ok(Self {
            addr,
            pool,
            video_provider,
            auth_provider,
            _handle: handle,
        })
    }

    /// Base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Socket address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Database pool backing the server.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The mock video provider, for call assertions.
    pub fn video_provider(&self) -> &MockVideoProvider {
        &self.video_provider
    }

    /// The mock auth provider, for call assertions.
    pub fn auth_provider(&self) -> &MockAuthProvider {
        &self.auth_provider
    }
}

impl Drop for TestCcServer {
    fn drop(&mut self) {
        // Abort the server task so the port is released when the test ends.
        self._handle.abort();
    }
}
