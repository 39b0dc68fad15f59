use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login: Option<String>,
}

/// Profile fields supplied by a Telegram login.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

impl User {
    pub async fn find_by_telegram_id(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, telegram_id, first_name, last_name, username, photo_url, is_admin, is_active, created_at, updated_at, last_login FROM users WHERE telegram_id = ?"
        )
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
    }

    /// Creates the user on first login and refreshes profile fields on
    /// every later one. Does not touch `is_admin` or `is_active`.
    pub async fn upsert_from_login(
        pool: &sqlx::SqlitePool,
        profile: &UserProfile,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, first_name, last_name, username, photo_url, is_admin, is_active, created_at, updated_at, last_login)
            VALUES (?, ?, ?, ?, ?, 0, 1, ?, ?, ?)
            ON CONFLICT(telegram_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                username = excluded.username,
                photo_url = excluded.photo_url,
                updated_at = excluded.updated_at,
                last_login = excluded.last_login
            "#,
        )
        .bind(profile.telegram_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .bind(&profile.photo_url)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find_by_telegram_id(pool, profile.telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Pre-creates a roster entry by id alone (an admin adding someone
    /// before their first login); reactivates the row if it already
    /// exists.
    pub async fn add_by_telegram_id(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
    ) -> Result<Self, sqlx::Error> {
        if Self::find_by_telegram_id(pool, telegram_id).await?.is_some() {
            sqlx::query("UPDATE users SET is_active = 1 WHERE telegram_id = ?")
                .bind(telegram_id)
                .execute(pool)
                .await?;
        } else {
            let now = Utc::now().to_rfc3339();
            sqlx::query(
                r#"
                INSERT INTO users (telegram_id, first_name, is_admin, is_active, created_at, updated_at)
                VALUES (?, ?, 0, 1, ?, ?)
                "#,
            )
            .bind(telegram_id)
            .bind(format!("User{telegram_id}"))
            .bind(&now)
            .bind(&now)
            .execute(pool)
            .await?;
        }

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn list_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, telegram_id, first_name, last_name, username, photo_url, is_admin, is_active, created_at, updated_at, last_login FROM users ORDER BY created_at DESC"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn set_admin(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        is_admin: bool,
    ) -> Result<bool, sqlx::Error> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE users SET is_admin = ?, updated_at = ? WHERE telegram_id = ?",
        )
        .bind(is_admin)
        .bind(&now)
        .bind(telegram_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_active(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
        is_active: bool,
    ) -> Result<bool, sqlx::Error> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE telegram_id = ?",
        )
        .bind(is_active)
        .bind(&now)
        .bind(telegram_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
