use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InviteCode {
    pub code: String,
    pub created_by: i64,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub used_by: Option<i64>,
    pub used_at: Option<String>,
    pub enabled: bool,
}

/// Invite joined with its creator's profile, for the admin listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InviteCodeWithCreator {
    pub code: String,
    pub created_by: i64,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub used_by: Option<i64>,
    pub used_at: Option<String>,
    pub enabled: bool,
    pub creator_first_name: Option<String>,
    pub creator_last_name: Option<String>,
    pub creator_username: Option<String>,
}

impl InviteCode {
    /// Short random token, unique enough for single-use codes.
    pub fn generate_code() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    pub async fn create(
        pool: &sqlx::SqlitePool,
        code: String,
        created_by: i64,
        expires_at: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO invite_codes (code, created_by, created_at, expires_at, enabled)
            VALUES (?, ?, ?, ?, 1)
            "#,
        )
        .bind(&code)
        .bind(created_by)
        .bind(&now)
        .bind(&expires_at)
        .execute(pool)
        .await?;

        Self::find_by_code(pool, &code)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_code(
        pool: &sqlx::SqlitePool,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            "SELECT code, created_by, created_at, expires_at, used_by, used_at, enabled FROM invite_codes WHERE code = ?"
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Consumes a code for a user. The enabled/unused/unexpired checks
    /// and the state flip are one guarded UPDATE, so a code can only
    /// ever be consumed once; `false` means the code was not usable
    /// and nothing changed.
    pub async fn consume(
        pool: &sqlx::SqlitePool,
        code: &str,
        telegram_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE invite_codes
            SET used_by = ?, used_at = ?, enabled = 0
            WHERE code = ? AND used_by IS NULL AND enabled = 1
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(telegram_id)
        .bind(&now)
        .bind(code)
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Disables a still-enabled code; `false` if it was unknown or
    /// already disabled.
    pub async fn revoke(pool: &sqlx::SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE invite_codes SET enabled = 0 WHERE code = ? AND enabled = 1")
            .bind(code)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_all(
        pool: &sqlx::SqlitePool,
    ) -> Result<Vec<InviteCodeWithCreator>, sqlx::Error> {
        sqlx::query_as::<_, InviteCodeWithCreator>(
            r#"
            SELECT ic.code, ic.created_by, ic.created_at, ic.expires_at, ic.used_by, ic.used_at, ic.enabled,
                   creator.first_name AS creator_first_name,
                   creator.last_name AS creator_last_name,
                   creator.username AS creator_username
            FROM invite_codes ic
            LEFT JOIN users creator ON ic.created_by = creator.telegram_id
            ORDER BY ic.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
