use chrono::{Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::datetime::{parse_training_time, weekday_from_name, weekday_name};
use crate::utils::validation::{validate_chat_id, validate_schedule_name};

/// A recurring weekly rule: training happens on `training_day` at
/// `training_time`, and the attendance poll for it is posted on
/// `poll_day`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PollSchedule {
    pub id: String,
    pub name: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
    pub training_day: String,
    pub poll_day: String,
    pub training_time: String,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub name: String,
    pub chat_id: String,
    #[serde(default)]
    pub topic_id: Option<i64>,
    pub training_day: String,
    pub poll_day: String,
    pub training_time: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Sparse update: only the supplied fields change, everything else is
/// carried over from the stored row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleUpdate {
    pub name: Option<String>,
    pub chat_id: Option<String>,
    pub topic_id: Option<i64>,
    pub training_day: Option<String>,
    pub poll_day: Option<String>,
    pub training_time: Option<String>,
    pub enabled: Option<bool>,
}

impl PollSchedule {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        new: NewSchedule,
    ) -> Result<Self, AppError> {
        validate_schedule_name(&new.name)?;
        validate_chat_id(&new.chat_id)?;
        let training_day = weekday_name(weekday_from_name(&new.training_day)?);
        let poll_day = weekday_name(weekday_from_name(&new.poll_day)?);
        parse_training_time(&new.training_time)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO poll_schedules
                (id, name, chat_id, topic_id, training_day, poll_day, training_time, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(new.chat_id.trim())
        .bind(new.topic_id)
        .bind(training_day)
        .bind(poll_day)
        .bind(new.training_time.trim())
        .bind(new.enabled)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("schedule {id}")))
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        schedule_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PollSchedule>(
            "SELECT id, name, chat_id, topic_id, training_day, poll_day, training_time, enabled, created_at, updated_at FROM poll_schedules WHERE id = ?"
        )
        .bind(schedule_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PollSchedule>(
            "SELECT id, name, chat_id, topic_id, training_day, poll_day, training_time, enabled, created_at, updated_at FROM poll_schedules ORDER BY created_at"
        )
        .fetch_all(pool)
        .await
    }

    /// Enabled schedules whose poll day is `today`; the daily tick
    /// posts a poll for each of these.
    pub async fn list_enabled_for_today(
        pool: &sqlx::SqlitePool,
        today: Weekday,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PollSchedule>(
            "SELECT id, name, chat_id, topic_id, training_day, poll_day, training_time, enabled, created_at, updated_at FROM poll_schedules WHERE enabled = 1 AND poll_day = ? ORDER BY created_at"
        )
        .bind(weekday_name(today))
        .fetch_all(pool)
        .await
    }

    /// Applies a sparse update read-modify-write: unspecified fields
    /// keep their stored values.
    pub async fn update(
        pool: &sqlx::SqlitePool,
        schedule_id: &str,
        update: ScheduleUpdate,
    ) -> Result<Self, AppError> {
        let existing = Self::find_by_id(pool, schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id}")))?;

        let name = update.name.unwrap_or(existing.name);
        let chat_id = update.chat_id.unwrap_or(existing.chat_id);
        let topic_id = update.topic_id.or(existing.topic_id);
        let training_day = update.training_day.unwrap_or(existing.training_day);
        let poll_day = update.poll_day.unwrap_or(existing.poll_day);
        let training_time = update.training_time.unwrap_or(existing.training_time);
        let enabled = update.enabled.unwrap_or(existing.enabled);

        validate_schedule_name(&name)?;
        validate_chat_id(&chat_id)?;
        let training_day = weekday_name(weekday_from_name(&training_day)?);
        let poll_day = weekday_name(weekday_from_name(&poll_day)?);
        parse_training_time(&training_time)?;

        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE poll_schedules
            SET name = ?, chat_id = ?, topic_id = ?, training_day = ?, poll_day = ?,
                training_time = ?, enabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name.trim())
        .bind(chat_id.trim())
        .bind(topic_id)
        .bind(training_day)
        .bind(poll_day)
        .bind(training_time.trim())
        .bind(enabled)
        .bind(&now)
        .bind(schedule_id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id}")))
    }

    pub async fn delete(
        pool: &sqlx::SqlitePool,
        schedule_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM poll_schedules WHERE id = ?")
            .bind(schedule_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
