//! Tenant repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{TenantRow, TenantSettings, TenantSettingsPatch};

pub struct TenantsRepository;

impl TenantsRepository {
    /// Insert a new tenant with resolved settings.
    ///
    /// Unique-violation on the domain surfaces as `sqlx::Error`; the service
    /// layer maps it to a validation error.
    pub async fn insert(
        pool: &PgPool,
        display_name: &str,
        domain: &str,
        settings: &TenantSettings,
    ) -> Result<TenantRow, sqlx::Error> {
        sqlx::query_as::<_, TenantRow>(
            r#"
            INSERT INTO tenants (
                display_name, domain, max_participants,
                chat_enabled, recording_enabled, allow_guest_access
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(display_name)
        .bind(domain)
        .bind(settings.max_participants)
        .bind(settings.chat_enabled)
        .bind(settings.recording_enabled)
        .bind(settings.allow_guest_access)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Option<TenantRow>, sqlx::Error> {
        sqlx::query_as::<_, TenantRow>("SELECT * FROM tenants WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_domain(
        pool: &PgPool,
        domain: &str,
    ) -> Result<Option<TenantRow>, sqlx::Error> {
        sqlx::query_as::<_, TenantRow>("SELECT * FROM tenants WHERE domain = $1")
            .bind(domain)
            .fetch_optional(pool)
            .await
    }

    /// Partial update: absent fields keep their current value.
    ///
    /// Returns `None` when the tenant does not exist.
    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        display_name: Option<&str>,
        settings: &TenantSettingsPatch,
    ) -> Result<Option<TenantRow>, sqlx::Error> {
        sqlx::query_as::<_, TenantRow>(
            r#"
            UPDATE tenants
            SET display_name       = COALESCE($2, display_name),
                max_participants   = COALESCE($3, max_participants),
                chat_enabled       = COALESCE($4, chat_enabled),
                recording_enabled  = COALESCE($5, recording_enabled),
                allow_guest_access = COALESCE($6, allow_guest_access),
                updated_at         = NOW()
            WHERE tenant_id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(display_name)
        .bind(settings.max_participants)
        .bind(settings.chat_enabled)
        .bind(settings.recording_enabled)
        .bind(settings.allow_guest_access)
        .fetch_optional(pool)
        .await
    }

    /// Delete a tenant. Users, meetings, participants and messages are
    /// removed by FK cascade.
    pub async fn delete(pool: &PgPool, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tenants WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
