use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::datetime::parse_training_time;
use crate::utils::validation::{validate_chat_id, validate_training_date};

/// An ad-hoc training that is not generated by any schedule. Shares
/// the occurrence identity shape (date + time + chat) with projected
/// trainings.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OneTimeTraining {
    pub id: String,
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
    pub name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOneTimeTraining {
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    #[serde(default)]
    pub topic_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl OneTimeTraining {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        new: NewOneTimeTraining,
    ) -> Result<Self, AppError> {
        validate_training_date(&new.training_date)?;
        parse_training_time(&new.training_time)?;
        validate_chat_id(&new.chat_id)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO one_time_trainings (id, training_date, training_time, chat_id, topic_id, name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(new.training_date.trim())
        .bind(new.training_time.trim())
        .bind(new.chat_id.trim())
        .bind(new.topic_id)
        .bind(&new.name)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, &id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("one-time training {id}")))
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        training_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, OneTimeTraining>(
            "SELECT id, training_date, training_time, chat_id, topic_id, name, created_at FROM one_time_trainings WHERE id = ?"
        )
        .bind(training_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_period(
        pool: &sqlx::SqlitePool,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, OneTimeTraining>(
            "SELECT id, training_date, training_time, chat_id, topic_id, name, created_at FROM one_time_trainings WHERE training_date BETWEEN ? AND ? ORDER BY training_date ASC, training_time ASC"
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await
    }

    /// Deletes the training and every registration for its occurrence.
    /// The occurrence key comes from the stored row's structured
    /// columns, so names containing arbitrary characters are safe.
    pub async fn delete(
        pool: &sqlx::SqlitePool,
        training_id: &str,
    ) -> Result<(), AppError> {
        let training = Self::find_by_id(pool, training_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("one-time training {training_id}")))?;

        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM training_registrations WHERE training_date = ? AND training_time = ? AND chat_id = ?"
        )
        .bind(&training.training_date)
        .bind(&training.training_time)
        .bind(&training.chat_id)
        .execute(&mut tx)
        .await?;

        sqlx::query("DELETE FROM one_time_trainings WHERE id = ?")
            .bind(training_id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
