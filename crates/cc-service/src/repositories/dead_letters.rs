//! Dead-letter repository for failed compensating deletes.
//!
//! When a compensating delete against an external provider fails, the
//! orphaned resource is recorded here and the session reaper retries it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Resource kinds tracked in the dead-letter log.
///
/// Attendee resource ids are stored as `"{session_id}/{attendee_id}"` since
/// the provider addresses attendees within a session.
pub const RESOURCE_SESSION: &str = "session";
pub const RESOURCE_ATTENDEE: &str = "attendee";
pub const RESOURCE_IDENTITY: &str = "identity";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeadLetterRow {
    pub failure_id: Uuid,
    pub resource_type: String,
    pub resource_id: String,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

pub struct DeadLettersRepository;

impl DeadLettersRepository {
    pub async fn insert(
        pool: &PgPool,
        resource_type: &str,
        resource_id: &str,
        action: &str,
        detail: &str,
    ) -> Result<DeadLetterRow, sqlx::Error> {
        sqlx::query_as::<_, DeadLetterRow>(
            r#"
            INSERT INTO compensation_failures (resource_type, resource_id, action, detail)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(resource_type)
        .bind(resource_id)
        .bind(action)
        .bind(detail)
        .fetch_one(pool)
        .await
    }

    /// Oldest unresolved entries, up to `limit`.
    pub async fn unresolved(pool: &PgPool, limit: i64) -> Result<Vec<DeadLetterRow>, sqlx::Error> {
        sqlx::query_as::<_, DeadLetterRow>(
            r#"
            SELECT * FROM compensation_failures
            WHERE resolved_at IS NULL
            ORDER BY created_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_resolved(pool: &PgPool, failure_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE compensation_failures
            SET resolved_at = NOW()
            WHERE failure_id = $1 AND resolved_at IS NULL
            "#,
        )
        .bind(failure_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
