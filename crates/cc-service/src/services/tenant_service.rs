//! Tenant and user provisioning.
//!
//! User identities live in the external auth provider; the profile row here
//! is subordinate to it. Provisioning therefore creates the identity first
//! and compensates with a delete when the local insert fails.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::CcError;
use crate::models::{
    CreateTenantRequest, CreateUserRequest, TenantRow, TenantSettings, TenantSettingsPatch,
    UpdateTenantRequest, UserRole, UserRow,
};
use crate::repositories::dead_letters::RESOURCE_IDENTITY;
use crate::repositories::tenants::TenantsRepository;
use crate::repositories::users::UsersRepository;
use crate::services::auth_provider::AuthProviderClient;
use crate::services::record_compensation_failure;

/// Whether a sqlx error is a unique violation on the given constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.to_string().contains(constraint)
}

pub struct TenantService;

impl TenantService {
    /// Create a tenant with server-side default settings where the request
    /// leaves them unset.
    pub async fn create_tenant(
        pool: &PgPool,
        request: &CreateTenantRequest,
    ) -> Result<TenantRow, CcError> {
        let settings = request
            .settings
            .as_ref()
            .map(TenantSettings::merged)
            .unwrap_or_default();

        TenantsRepository::insert(pool, request.name.trim(), &request.domain, &settings)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "tenants_domain_unique") {
                    CcError::Validation("A tenant with this domain already exists".to_string())
                } else {
                    CcError::from(e)
                }
            })
    }

    pub async fn get_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Option<TenantRow>, CcError> {
        Ok(TenantsRepository::find_by_id(pool, tenant_id).await?)
    }

    pub async fn get_tenant_by_domain(
        pool: &PgPool,
        domain: &str,
    ) -> Result<Option<TenantRow>, CcError> {
        Ok(TenantsRepository::find_by_domain(pool, domain).await?)
    }

    pub async fn update_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
        request: &UpdateTenantRequest,
    ) -> Result<TenantRow, CcError> {
        let empty_patch = TenantSettingsPatch::default();
        let settings = request.settings.as_ref().unwrap_or(&empty_patch);

        TenantsRepository::update(
            pool,
            tenant_id,
            request.name.as_deref().map(str::trim),
            settings,
        )
        .await?
        .ok_or_else(|| CcError::NotFound("Tenant not found".to_string()))
    }

    /// Delete a tenant. Users, meetings, participants and chat messages go
    /// with it via FK cascade.
    pub async fn delete_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<(), CcError> {
        let deleted = TenantsRepository::delete(pool, tenant_id).await?;
        if deleted {
            Ok(())
        } else {
            Err(CcError::NotFound("Tenant not found".to_string()))
        }
    }

    /// Provision a user: auth-provider identity first, then the profile row.
    ///
    /// If the profile insert fails the identity is deleted again; a failure
    /// of that compensating delete is dead-lettered for the reaper.
    pub async fn create_user(
        pool: &PgPool,
        auth_provider: &dyn AuthProviderClient,
        tenant_id: Uuid,
        request: &CreateUserRequest,
    ) -> Result<UserRow, CcError> {
        let tenant = TenantsRepository::find_by_id(pool, tenant_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Tenant not found".to_string()))?;

        let role = request.role.unwrap_or(UserRole::User);
        if role == UserRole::Guest && !tenant.allow_guest_access {
            return Err(CcError::Validation(
                "Guest access is not enabled for this tenant".to_string(),
            ));
        }

        let identity = auth_provider
            .create_identity(&request.email, request.name.trim())
            .await?;

        let inserted = UsersRepository::insert(
            pool,
            identity.user_id,
            tenant_id,
            &request.email,
            request.name.trim(),
            role.as_str(),
            request.avatar_url.as_deref(),
        )
        .await;

        match inserted {
            Ok(user) => Ok(user),
            Err(e) => {
                if let Err(comp_err) = auth_provider.delete_identity(identity.user_id).await {
                    record_compensation_failure(
                        pool,
                        RESOURCE_IDENTITY,
                        &identity.user_id.to_string(),
                        "delete_identity",
                        &comp_err,
                    )
                    .await;
                }

                if is_unique_violation(&e, "users_tenant_email_unique") {
                    Err(CcError::Validation(
                        "A user with this email already exists in this tenant".to_string(),
                    ))
                } else {
                    Err(CcError::from(e))
                }
            }
        }
    }

    pub async fn get_user(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UserRow>, CcError> {
        Ok(UsersRepository::find_by_id(pool, tenant_id, user_id).await?)
    }

    pub async fn get_user_by_email(
        pool: &PgPool,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<UserRow>, CcError> {
        Ok(UsersRepository::find_by_email(pool, tenant_id, email).await?)
    }

    pub async fn get_tenant_users(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<UserRow>, CcError> {
        Ok(UsersRepository::list_for_tenant(pool, tenant_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::repositories::dead_letters::DeadLettersRepository;
    use crate::services::auth_provider::mock::{AuthCall, MockAuthProvider};

    fn tenant_request(domain: &str) -> CreateTenantRequest {
        CreateTenantRequest {
            name: "Acme".to_string(),
            domain: domain.to_string(),
            settings: None,
        }
    }

    fn user_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            name: "Alice".to_string(),
            role: None,
            avatar_url: None,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_tenant_duplicate_domain_is_validation_error(pool: PgPool) {
        TenantService::create_tenant(&pool, &tenant_request("acme.test"))
            .await
            .expect("first create should succeed");

        let err = TenantService::create_tenant(&pool, &tenant_request("acme.test"))
            .await
            .expect_err("duplicate domain should fail");

        assert!(matches!(err, CcError::Validation(_)));
        assert!(err.client_message().contains("domain"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_user_uses_provider_identity(pool: PgPool) {
        let tenant = TenantService::create_tenant(&pool, &tenant_request("acme.test"))
            .await
            .expect("tenant create should succeed");
        let auth = MockAuthProvider::accepting();

        let user = TenantService::create_user(
            &pool,
            &auth,
            tenant.tenant_id,
            &user_request("alice@acme.test"),
        )
        .await
        .expect("user create should succeed");

        assert_eq!(user.role, "user");

        // The stored id is the one the provider issued
        let calls = auth.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], AuthCall::CreateIdentity { email, .. } if email == "alice@acme.test"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_user_unknown_tenant(pool: PgPool) {
        let auth = MockAuthProvider::accepting();
        let err = TenantService::create_user(
            &pool,
            &auth,
            Uuid::new_v4(),
            &user_request("alice@acme.test"),
        )
        .await
        .expect_err("unknown tenant should fail");

        assert!(matches!(err, CcError::NotFound(_)));
        assert!(auth.calls().is_empty(), "no identity should be provisioned");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_user_duplicate_email_compensates_identity(pool: PgPool) {
        let tenant = TenantService::create_tenant(&pool, &tenant_request("acme.test"))
            .await
            .expect("tenant create should succeed");
        let auth = MockAuthProvider::accepting();

        TenantService::create_user(
            &pool,
            &auth,
            tenant.tenant_id,
            &user_request("alice@acme.test"),
        )
        .await
        .expect("first user create should succeed");

        let err = TenantService::create_user(
            &pool,
            &auth,
            tenant.tenant_id,
            &user_request("alice@acme.test"),
        )
        .await
        .expect_err("duplicate email should fail");

        assert!(matches!(err, CcError::Validation(_)));

        // The second identity was compensated away
        let calls = auth.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[2], AuthCall::DeleteIdentity { .. }));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_failed_compensation_is_dead_lettered(pool: PgPool) {
        let tenant = TenantService::create_tenant(&pool, &tenant_request("acme.test"))
            .await
            .expect("tenant create should succeed");

        let accepting = MockAuthProvider::accepting();
        TenantService::create_user(
            &pool,
            &accepting,
            tenant.tenant_id,
            &user_request("alice@acme.test"),
        )
        .await
        .expect("first user create should succeed");

        // Same email again, with a provider whose delete always fails
        let failing = MockAuthProvider::failing_delete();
        let err = TenantService::create_user(
            &pool,
            &failing,
            tenant.tenant_id,
            &user_request("alice@acme.test"),
        )
        .await
        .expect_err("duplicate email should fail");
        assert!(matches!(err, CcError::Validation(_)));

        let pending = DeadLettersRepository::unresolved(&pool, 10)
            .await
            .expect("query should succeed");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].resource_type, "identity");
        assert_eq!(pending[0].action, "delete_identity");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_guest_requires_tenant_toggle(pool: PgPool) {
        let tenant = TenantService::create_tenant(&pool, &tenant_request("acme.test"))
            .await
            .expect("tenant create should succeed");
        let auth = MockAuthProvider::accepting();

        let mut request = user_request("guest@acme.test");
        request.role = Some(UserRole::Guest);

        let err = TenantService::create_user(&pool, &auth, tenant.tenant_id, &request)
            .await
            .expect_err("guest should be rejected by default");
        assert!(matches!(err, CcError::Validation(_)));
        assert!(auth.calls().is_empty());

        // Enable guest access and retry
        let update = UpdateTenantRequest {
            name: None,
            settings: Some(TenantSettingsPatch {
                allow_guest_access: Some(true),
                ..Default::default()
            }),
        };
        TenantService::update_tenant(&pool, tenant.tenant_id, &update)
            .await
            .expect("update should succeed");

        let guest = TenantService::create_user(&pool, &auth, tenant.tenant_id, &request)
            .await
            .expect("guest create should now succeed");
        assert_eq!(guest.role, "guest");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_and_delete_missing_tenant(pool: PgPool) {
        let update = UpdateTenantRequest {
            name: Some("New".to_string()),
            settings: None,
        };
        let err = TenantService::update_tenant(&pool, Uuid::new_v4(), &update)
            .await
            .expect_err("missing tenant should fail");
        assert!(matches!(err, CcError::NotFound(_)));

        let err = TenantService::delete_tenant(&pool, Uuid::new_v4())
            .await
            .expect_err("missing tenant should fail");
        assert!(matches!(err, CcError::NotFound(_)));
    }
}
