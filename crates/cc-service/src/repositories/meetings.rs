//! Meeting repository.
//!
//! Status transitions are enforced in SQL with conditional UPDATEs so that
//! concurrent requests cannot race a meeting out of a terminal state.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{MeetingRow, MeetingSettings};

pub struct MeetingsRepository;

impl MeetingsRepository {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        tenant_id: Uuid,
        title: &str,
        description: Option<&str>,
        host_user_id: Uuid,
        settings: &MeetingSettings,
        scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
        external_session_id: &str,
        media_region: &str,
    ) -> Result<MeetingRow, sqlx::Error> {
        sqlx::query_as::<_, MeetingRow>(
            r#"
            INSERT INTO meetings (
                tenant_id, title, description, host_user_id,
                recording_enabled, chat_enabled, screen_share_enabled,
                waiting_room_enabled, scheduled_at, external_session_id,
                media_region
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(title)
        .bind(description)
        .bind(host_user_id)
        .bind(settings.recording_enabled)
        .bind(settings.chat_enabled)
        .bind(settings.screen_share_enabled)
        .bind(settings.waiting_room_enabled)
        .bind(scheduled_at)
        .bind(external_session_id)
        .bind(media_region)
        .fetch_one(pool)
        .await
    }

    /// Tenant-scoped lookup.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        meeting_id: Uuid,
    ) -> Result<Option<MeetingRow>, sqlx::Error> {
        sqlx::query_as::<_, MeetingRow>(
            "SELECT * FROM meetings WHERE tenant_id = $1 AND meeting_id = $2",
        )
        .bind(tenant_id)
        .bind(meeting_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<MeetingRow>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, MeetingRow>(
                    r#"
                    SELECT * FROM meetings
                    WHERE tenant_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(tenant_id)
                .bind(status)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, MeetingRow>(
                    "SELECT * FROM meetings WHERE tenant_id = $1 ORDER BY created_at DESC",
                )
                .bind(tenant_id)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Transition `scheduled -> active` and stamp `started_at`.
    ///
    /// Returns `false` when the meeting was not in `scheduled`; callers
    /// treat that as "already activated".
    pub async fn activate(pool: &PgPool, meeting_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE meetings
            SET status = 'active', started_at = NOW(), updated_at = NOW()
            WHERE meeting_id = $1 AND status = 'scheduled'
            "#,
        )
        .bind(meeting_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition to `ended` from any non-terminal status.
    ///
    /// Returns the updated row when the transition happened, `None` when the
    /// meeting was already terminal (or absent). This is what makes
    /// `end_meeting` idempotent.
    pub async fn end(pool: &PgPool, meeting_id: Uuid) -> Result<Option<MeetingRow>, sqlx::Error> {
        sqlx::query_as::<_, MeetingRow>(
            r#"
            UPDATE meetings
            SET status = 'ended', ended_at = NOW(), updated_at = NOW()
            WHERE meeting_id = $1 AND status IN ('scheduled', 'active')
            RETURNING *
            "#,
        )
        .bind(meeting_id)
        .fetch_optional(pool)
        .await
    }

    /// Transition to `cancelled` from `scheduled` or `active`.
    pub async fn cancel(
        pool: &PgPool,
        meeting_id: Uuid,
    ) -> Result<Option<MeetingRow>, sqlx::Error> {
        sqlx::query_as::<_, MeetingRow>(
            r#"
            UPDATE meetings
            SET status = 'cancelled', ended_at = NOW(), updated_at = NOW()
            WHERE meeting_id = $1 AND status IN ('scheduled', 'active')
            RETURNING *
            "#,
        )
        .bind(meeting_id)
        .fetch_optional(pool)
        .await
    }

    /// External session ids for all non-terminal meetings. Used by the
    /// session reaper to identify orphaned provider sessions.
    pub async fn live_external_session_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT external_session_id FROM meetings
            WHERE status IN ('scheduled', 'active')
              AND external_session_id IS NOT NULL
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
