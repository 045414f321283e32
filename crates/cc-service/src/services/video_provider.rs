//! Client for the external video-session provider.
//!
//! The provider owns the real-time media sessions; this service only holds
//! handles (session ids, attendee ids) to them. All calls go through the
//! `VideoProviderClient` trait so tests can substitute a mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CcError;

/// A media session created by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub session_id: String,
    pub media_region: String,
}

/// A provider attendee: the per-participant credential for joining a session.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderAttendee {
    pub attendee_id: String,
    pub join_token: String,
}

#[async_trait]
pub trait VideoProviderClient: Send + Sync {
    /// Create a media session for a meeting.
    async fn create_session(
        &self,
        tenant_id: Uuid,
        title: &str,
    ) -> Result<ProviderSession, CcError>;

    /// Delete a media session. Idempotent: deleting an unknown session
    /// succeeds.
    async fn delete_session(&self, session_id: &str) -> Result<(), CcError>;

    /// Register an attendee on a session and mint their join token.
    async fn create_attendee(
        &self,
        session_id: &str,
        user_id: Uuid,
    ) -> Result<ProviderAttendee, CcError>;

    /// Remove an attendee from a session. Idempotent.
    async fn delete_attendee(&self, session_id: &str, attendee_id: &str) -> Result<(), CcError>;

    /// All session ids the provider currently holds. Used by the session
    /// reaper to find orphans.
    async fn list_sessions(&self) -> Result<Vec<String>, CcError>;
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    tenant_id: Uuid,
    title: &'a str,
}

#[derive(Serialize)]
struct CreateAttendeeRequest {
    user_id: Uuid,
}

/// HTTP implementation backed by reqwest.
pub struct HttpVideoProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpVideoProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        builder
    }

    /// Map a non-success response to a provider error, keeping the status
    /// for diagnostics.
    async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response, CcError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(CcError::Provider(format!(
                "{context} returned HTTP {status}"
            )))
        }
    }
}

#[async_trait]
impl VideoProviderClient for HttpVideoProvider {
    async fn create_session(
        &self,
        tenant_id: Uuid,
        title: &str,
    ) -> Result<ProviderSession, CcError> {
        let response = self
            .request(reqwest::Method::POST, "/sessions")
            .json(&CreateSessionRequest { tenant_id, title })
            .send()
            .await?;

        let response = Self::check(response, "create_session").await?;
        Ok(response.json::<ProviderSession>().await?)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), CcError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/sessions/{session_id}"))
            .send()
            .await?;

        // A 404 means the session is already gone; that is the desired state.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check(response, "delete_session").await?;
        Ok(())
    }

    async fn create_attendee(
        &self,
        session_id: &str,
        user_id: Uuid,
    ) -> Result<ProviderAttendee, CcError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/sessions/{session_id}/attendees"),
            )
            .json(&CreateAttendeeRequest { user_id })
            .send()
            .await?;

        let response = Self::check(response, "create_attendee").await?;
        Ok(response.json::<ProviderAttendee>().await?)
    }

    async fn delete_attendee(&self, session_id: &str, attendee_id: &str) -> Result<(), CcError> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/sessions/{session_id}/attendees/{attendee_id}"),
            )
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check(response, "delete_attendee").await?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, CcError> {
        let response = self.request(reqwest::Method::GET, "/sessions").send().await?;
        let response = Self::check(response, "list_sessions").await?;
        Ok(response.json::<Vec<String>>().await?)
    }
}

pub mod mock {
    //! In-process mock for tests. Records every call and tracks the set of
    //! live sessions so reconciliation logic can be exercised without a
    //! network.

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// A recorded provider call, for test assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ProviderCall {
        CreateSession { tenant_id: Uuid, title: String },
        DeleteSession { session_id: String },
        CreateAttendee { session_id: String, user_id: Uuid },
        DeleteAttendee { session_id: String, attendee_id: String },
        ListSessions,
    }

    #[derive(Default)]
    struct MockState {
        calls: Vec<ProviderCall>,
        sessions: Vec<String>,
    }

    #[derive(Clone, Default)]
    pub struct MockVideoProvider {
        state: Arc<Mutex<MockState>>,
        counter: Arc<AtomicU64>,
        fail_create_session: bool,
        fail_create_attendee: bool,
        fail_deletes: bool,
    }

    impl MockVideoProvider {
        /// A mock that accepts every call.
        pub fn accepting() -> Self {
            Self::default()
        }

        /// A mock whose `create_session` always fails.
        pub fn failing_create_session() -> Self {
            Self {
                fail_create_session: true,
                ..Self::default()
            }
        }

        /// A mock whose `create_attendee` always fails.
        pub fn failing_create_attendee() -> Self {
            Self {
                fail_create_attendee: true,
                ..Self::default()
            }
        }

        /// A mock whose delete calls always fail (compensation paths).
        pub fn failing_deletes() -> Self {
            Self {
                fail_deletes: true,
                ..Self::default()
            }
        }

        /// Pre-seed the set of live provider sessions.
        pub fn with_sessions(session_ids: Vec<String>) -> Self {
            let mock = Self::default();
            if let Ok(mut state) = mock.state.lock() {
                state.sessions = session_ids;
            }
            mock
        }

        /// All calls made so far, in order.
        pub fn calls(&self) -> Vec<ProviderCall> {
            self.state
                .lock()
                .map(|state| state.calls.clone())
                .unwrap_or_default()
        }

        /// Number of `delete_session` calls for a specific session id.
        pub fn delete_session_count(&self, session_id: &str) -> usize {
            self.calls()
                .iter()
                .filter(|call| {
                    matches!(call, ProviderCall::DeleteSession { session_id: id } if id == session_id)
                })
                .count()
        }

        /// Session ids the mock currently considers live.
        pub fn live_sessions(&self) -> Vec<String> {
            self.state
                .lock()
                .map(|state| state.sessions.clone())
                .unwrap_or_default()
        }

        fn record(&self, call: ProviderCall) {
            if let Ok(mut state) = self.state.lock() {
                state.calls.push(call);
            }
        }

        // Ids are 1-based so the first session is "mock-session-1".
        fn next_id(&self) -> u64 {
            self.counter.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    #[async_trait]
    impl VideoProviderClient for MockVideoProvider {
        async fn create_session(
            &self,
            tenant_id: Uuid,
            title: &str,
        ) -> Result<ProviderSession, CcError> {
            self.record(ProviderCall::CreateSession {
                tenant_id,
                title: title.to_string(),
            });

            if self.fail_create_session {
                return Err(CcError::Provider("injected create_session failure".to_string()));
            }

            let session_id = format!("mock-session-{}", self.next_id());
            if let Ok(mut state) = self.state.lock() {
                state.sessions.push(session_id.clone());
            }

            Ok(ProviderSession {
                session_id,
                media_region: "local-1".to_string(),
            })
        }

        async fn delete_session(&self, session_id: &str) -> Result<(), CcError> {
            self.record(ProviderCall::DeleteSession {
                session_id: session_id.to_string(),
            });

            if self.fail_deletes {
                return Err(CcError::Provider("injected delete_session failure".to_string()));
            }

            if let Ok(mut state) = self.state.lock() {
                state.sessions.retain(|id| id != session_id);
            }

            Ok(())
        }

        async fn create_attendee(
            &self,
            session_id: &str,
            user_id: Uuid,
        ) -> Result<ProviderAttendee, CcError> {
            self.record(ProviderCall::CreateAttendee {
                session_id: session_id.to_string(),
                user_id,
            });

            if self.fail_create_attendee {
                return Err(CcError::Provider("injected create_attendee failure".to_string()));
            }

            let id = self.next_id();
            Ok(ProviderAttendee {
                attendee_id: format!("mock-attendee-{id}"),
                join_token: format!("mock-token-{id}"),
            })
        }

        async fn delete_attendee(
            &self,
            session_id: &str,
            attendee_id: &str,
        ) -> Result<(), CcError> {
            self.record(ProviderCall::DeleteAttendee {
                session_id: session_id.to_string(),
                attendee_id: attendee_id.to_string(),
            });

            if self.fail_deletes {
                return Err(CcError::Provider("injected delete_attendee failure".to_string()));
            }

            Ok(())
        }

        async fn list_sessions(&self) -> Result<Vec<String>, CcError> {
            self.record(ProviderCall::ListSessions);
            Ok(self.live_sessions())
        }
    }
}
