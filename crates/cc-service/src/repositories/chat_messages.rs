//! Chat message repository. Append-only, meeting-scoped.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ChatMessageRow;

pub struct ChatMessagesRepository;

impl ChatMessagesRepository {
    pub async fn insert(
        pool: &PgPool,
        meeting_id: Uuid,
        user_id: Uuid,
        body: &str,
    ) -> Result<ChatMessageRow, sqlx::Error> {
        sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (meeting_id, user_id, body)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(meeting_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(pool)
        .await
    }

    /// Messages for a meeting in chronological order.
    pub async fn list_for_meeting(
        pool: &PgPool,
        meeting_id: Uuid,
    ) -> Result<Vec<ChatMessageRow>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessageRow>(
            "SELECT * FROM chat_messages WHERE meeting_id = $1 ORDER BY created_at",
        )
        .bind(meeting_id)
        .fetch_all(pool)
        .await
    }
}
