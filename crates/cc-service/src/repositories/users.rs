//! User repository.
//!
//! `user_id` values are issued by the external auth provider and inserted
//! as-is; this table only stores the tenant-scoped profile.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserRow;

pub struct UsersRepository;

impl UsersRepository {
    pub async fn insert(
        pool: &PgPool,
        user_id: Uuid,
        tenant_id: Uuid,
        email: &str,
        display_name: &str,
        role: &str,
        avatar_url: Option<&str>,
    ) -> Result<UserRow, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (user_id, tenant_id, email, display_name, role, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(email)
        .bind(display_name)
        .bind(role)
        .bind(avatar_url)
        .fetch_one(pool)
        .await
    }

    /// Tenant-scoped lookup; a user id from another tenant returns `None`.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(
        pool: &PgPool,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE tenant_id = $1 AND email = $2",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
    ) -> Result<Vec<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE tenant_id = $1 ORDER BY created_at",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
