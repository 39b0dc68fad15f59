use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Record of a published poll message. Purely informational: the tick
/// does not consult it before posting, so a tick fired twice on the
/// same day posts twice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivePoll {
    pub id: String,
    pub chat_id: String,
    pub message_id: i64,
    pub topic_id: Option<i64>,
    pub schedule_id: Option<String>,
    pub created_at: String,
}

impl ActivePoll {
    pub async fn record(
        pool: &sqlx::SqlitePool,
        chat_id: &str,
        message_id: i64,
        topic_id: Option<i64>,
        schedule_id: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO active_polls (id, chat_id, message_id, topic_id, schedule_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(chat_id)
        .bind(message_id)
        .bind(topic_id)
        .bind(schedule_id)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(ActivePoll {
            id,
            chat_id: chat_id.to_string(),
            message_id,
            topic_id,
            schedule_id: schedule_id.map(str::to_string),
            created_at: now,
        })
    }

    pub async fn list_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivePoll>(
            "SELECT id, chat_id, message_id, topic_id, schedule_id, created_at FROM active_polls ORDER BY created_at"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn remove(pool: &sqlx::SqlitePool, poll_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM active_polls WHERE id = ?")
            .bind(poll_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
