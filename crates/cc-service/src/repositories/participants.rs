//! Meeting participant repository.
//!
//! Participation is keyed on (meeting_id, user_id): rejoining updates the
//! existing row instead of inserting a duplicate, and rows are never
//! hard-deleted so join history survives a leave.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ParticipantRow;

pub struct ParticipantsRepository;

impl ParticipantsRepository {
    /// Insert or revive a participant row.
    ///
    /// On conflict the row is marked present again with a fresh `joined_at`
    /// and the new display name, email and attendee handle.
    pub async fn upsert(
        pool: &PgPool,
        meeting_id: Uuid,
        user_id: Uuid,
        display_name: &str,
        email: &str,
        role: &str,
        external_attendee_id: &str,
    ) -> Result<ParticipantRow, sqlx::Error> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            INSERT INTO meeting_participants (
                meeting_id, user_id, display_name, email, role, external_attendee_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (meeting_id, user_id) DO UPDATE
            SET display_name         = EXCLUDED.display_name,
                email                = EXCLUDED.email,
                external_attendee_id = EXCLUDED.external_attendee_id,
                is_present           = TRUE,
                left_at              = NULL,
                joined_at            = NOW()
            RETURNING *
            "#,
        )
        .bind(meeting_id)
        .bind(user_id)
        .bind(display_name)
        .bind(email)
        .bind(role)
        .bind(external_attendee_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        meeting_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ParticipantRow>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantRow>(
            "SELECT * FROM meeting_participants WHERE meeting_id = $1 AND user_id = $2",
        )
        .bind(meeting_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_meeting(
        pool: &PgPool,
        meeting_id: Uuid,
    ) -> Result<Vec<ParticipantRow>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantRow>(
            "SELECT * FROM meeting_participants WHERE meeting_id = $1 ORDER BY joined_at",
        )
        .bind(meeting_id)
        .fetch_all(pool)
        .await
    }

    /// Mark a participant as having left. Returns the updated row, or `None`
    /// when no such participant exists.
    pub async fn mark_left(
        pool: &PgPool,
        meeting_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ParticipantRow>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantRow>(
            r#"
            UPDATE meeting_participants
            SET is_present = FALSE,
                left_at    = COALESCE(left_at, NOW())
            WHERE meeting_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(meeting_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Mark every present participant as left. Used when a meeting ends.
    pub async fn mark_all_left(pool: &PgPool, meeting_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE meeting_participants
            SET is_present = FALSE, left_at = NOW()
            WHERE meeting_id = $1 AND is_present = TRUE
            "#,
        )
        .bind(meeting_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_present(pool: &PgPool, meeting_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM meeting_participants WHERE meeting_id = $1 AND is_present = TRUE",
        )
        .bind(meeting_id)
        .fetch_one(pool)
        .await
    }
}
