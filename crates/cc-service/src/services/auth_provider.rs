//! Client for the external auth provider.
//!
//! User identities (and their ids) are issued by the auth provider; this
//! service only stores the tenant-scoped profile next to them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CcError;

/// An identity issued by the auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIdentity {
    pub user_id: Uuid,
}

#[async_trait]
pub trait AuthProviderClient: Send + Sync {
    /// Provision an identity and return its provider-issued user id.
    async fn create_identity(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<ProviderIdentity, CcError>;

    /// Delete an identity. Idempotent.
    async fn delete_identity(&self, user_id: Uuid) -> Result<(), CcError>;
}

#[derive(Serialize)]
struct CreateIdentityRequest<'a> {
    email: &'a str,
    display_name: &'a str,
}

/// HTTP implementation backed by reqwest.
pub struct HttpAuthProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl AuthProviderClient for HttpAuthProvider {
    async fn create_identity(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<ProviderIdentity, CcError> {
        let response = self
            .client
            .post(format!("{}/identities", self.base_url))
            .json(&CreateIdentityRequest {
                email,
                display_name,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CcError::Provider(format!(
                "create_identity returned HTTP {status}"
            )));
        }

        Ok(response.json::<ProviderIdentity>().await?)
    }

    async fn delete_identity(&self, user_id: Uuid) -> Result<(), CcError> {
        let response = self
            .client
            .delete(format!("{}/identities/{user_id}", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status.is_success() {
            Ok(())
        } else {
            Err(CcError::Provider(format!(
                "delete_identity returned HTTP {status}"
            )))
        }
    }
}

pub mod mock {
    //! In-process mock for tests.

    use std::sync::{Arc, Mutex};

    use super::*;

    /// A recorded auth provider call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AuthCall {
        CreateIdentity { email: String, display_name: String },
        DeleteIdentity { user_id: Uuid },
    }

    #[derive(Clone, Default)]
    pub struct MockAuthProvider {
        calls: Arc<Mutex<Vec<AuthCall>>>,
        fail_create: bool,
        fail_delete: bool,
    }

    impl MockAuthProvider {
        /// A mock that accepts every call.
        pub fn accepting() -> Self {
            Self::default()
        }

        /// A mock whose `create_identity` always fails.
        pub fn failing_create() -> Self {
            Self {
                fail_create: true,
                ..Self::default()
            }
        }

        /// A mock whose `delete_identity` always fails.
        pub fn failing_delete() -> Self {
            Self {
                fail_delete: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<AuthCall> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn record(&self, call: AuthCall) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    #[async_trait]
    impl AuthProviderClient for MockAuthProvider {
        async fn create_identity(
            &self,
            email: &str,
            display_name: &str,
        ) -> Result<ProviderIdentity, CcError> {
            self.record(AuthCall::CreateIdentity {
                email: email.to_string(),
                display_name: display_name.to_string(),
            });

            if self.fail_create {
                return Err(CcError::Provider("injected create_identity failure".to_string()));
            }

            Ok(ProviderIdentity {
                user_id: Uuid::new_v4(),
            })
        }

        async fn delete_identity(&self, user_id: Uuid) -> Result<(), CcError> {
            self.record(AuthCall::DeleteIdentity { user_id });

            if self.fail_delete {
                return Err(CcError::Provider("injected delete_identity failure".to_string()));
            }

            Ok(())
        }
    }
}
