use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed number of slots per training; everyone past it goes to the
/// waitlist.
pub const TRAINING_CAPACITY: i64 = 12;

/// One concrete training a user can sign up for. Two slots on the same
/// date are distinct occurrences, so the key carries date, time and
/// chat together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Waitlist,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Waitlist => "waitlist",
        }
    }

    fn from_db(value: &str) -> Self {
        if value == "waitlist" {
            RegistrationStatus::Waitlist
        } else {
            RegistrationStatus::Registered
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
    pub user_telegram_id: i64,
    pub status: String,
    pub registered_at: String,
}

/// Registration joined with the public profile fields of its user,
/// as shown on the occurrence roster.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OccurrenceRegistration {
    pub id: String,
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
    pub user_telegram_id: i64,
    pub status: String,
    pub registered_at: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

/// Per-occurrence counts used by the calendar view.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationRollup {
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    pub registered_count: i64,
    pub waitlist_count: i64,
    pub my_status: Option<String>,
}

impl Registration {
    /// Signs a user up for an occurrence and returns the resulting
    /// status.
    ///
    /// The count of occupied slots, the capacity decision and the
    /// upsert all happen in a single SQL statement, so two callers
    /// racing for the last slot serialize on the database write lock
    /// and exactly one of them is admitted. The embedded count skips
    /// the caller's own row: a repeat call sees the occurrence as if
    /// its previous registration were already gone and keeps its
    /// status stable.
    pub async fn register(
        pool: &sqlx::SqlitePool,
        key: &OccurrenceKey,
        topic_id: Option<i64>,
        user_telegram_id: i64,
    ) -> Result<RegistrationStatus, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let status: String = sqlx::query_scalar(
            r#"
            INSERT INTO training_registrations
                (id, training_date, training_time, chat_id, topic_id, user_telegram_id, status, registered_at)
            VALUES
                (?1, ?2, ?3, ?4, ?5, ?6,
                 CASE WHEN (SELECT COUNT(*) FROM training_registrations
                            WHERE training_date = ?2 AND training_time = ?3 AND chat_id = ?4
                              AND status = 'registered' AND user_telegram_id <> ?6) < ?7
                      THEN 'registered' ELSE 'waitlist' END,
                 ?8)
            ON CONFLICT(training_date, training_time, chat_id, user_telegram_id)
            DO UPDATE SET status = excluded.status, topic_id = excluded.topic_id
            RETURNING status
            "#,
        )
        .bind(&id)
        .bind(&key.training_date)
        .bind(&key.training_time)
        .bind(&key.chat_id)
        .bind(topic_id)
        .bind(user_telegram_id)
        .bind(TRAINING_CAPACITY)
        .bind(&now)
        .fetch_one(pool)
        .await?;

        Ok(RegistrationStatus::from_db(&status))
    }

    /// Removes a user's registration and promotes the longest-waiting
    /// waitlisted user into the freed slot, if the occurrence has room.
    ///
    /// At most one promotion happens per call, and only while the
    /// registered count is below capacity, so a waitlisted user
    /// leaving never pushes the occurrence over the limit. The
    /// promoted row keeps its original `registered_at`; waitlist
    /// order is by when people first signed up, not by promotions.
    pub async fn unregister(
        pool: &sqlx::SqlitePool,
        key: &OccurrenceKey,
        user_telegram_id: i64,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM training_registrations
            WHERE training_date = ? AND training_time = ? AND chat_id = ? AND user_telegram_id = ?
            "#,
        )
        .bind(&key.training_date)
        .bind(&key.training_time)
        .bind(&key.chat_id)
        .bind(user_telegram_id)
        .execute(&mut tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE training_registrations
            SET status = 'registered'
            WHERE id = (SELECT id FROM training_registrations
                        WHERE training_date = ?1 AND training_time = ?2 AND chat_id = ?3
                          AND status = 'waitlist'
                        ORDER BY registered_at ASC
                        LIMIT 1)
              AND (SELECT COUNT(*) FROM training_registrations
                   WHERE training_date = ?1 AND training_time = ?2 AND chat_id = ?3
                     AND status = 'registered') < ?4
            "#,
        )
        .bind(&key.training_date)
        .bind(&key.training_time)
        .bind(&key.chat_id)
        .bind(TRAINING_CAPACITY)
        .execute(&mut tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// All registrations of one user, ordered by occurrence date then
    /// time.
    pub async fn list_for_user(
        pool: &sqlx::SqlitePool,
        user_telegram_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, training_date, training_time, chat_id, topic_id,
                   user_telegram_id, status, registered_at
            FROM training_registrations
            WHERE user_telegram_id = ?
            ORDER BY training_date ASC, training_time ASC
            "#,
        )
        .bind(user_telegram_id)
        .fetch_all(pool)
        .await
    }

    /// Roster of one occurrence in sign-up order. The ordering is what
    /// splits the list into registered and waitlist groups in the UI
    /// and what promotion relies on.
    pub async fn list_for_occurrence(
        pool: &sqlx::SqlitePool,
        key: &OccurrenceKey,
    ) -> Result<Vec<OccurrenceRegistration>, sqlx::Error> {
        sqlx::query_as::<_, OccurrenceRegistration>(
            r#"
            SELECT tr.id, tr.training_date, tr.training_time, tr.chat_id, tr.topic_id,
                   tr.user_telegram_id, tr.status, tr.registered_at,
                   u.first_name, u.last_name, u.username, u.photo_url
            FROM training_registrations tr
            LEFT JOIN users u ON tr.user_telegram_id = u.telegram_id
            WHERE tr.training_date = ? AND tr.training_time = ? AND tr.chat_id = ?
            ORDER BY tr.registered_at ASC
            "#,
        )
        .bind(&key.training_date)
        .bind(&key.training_time)
        .bind(&key.chat_id)
        .fetch_all(pool)
        .await
    }

    /// Registered/waitlist counts per occurrence for a date range,
    /// with the viewer's own status attached.
    pub async fn rollups_for_period(
        pool: &sqlx::SqlitePool,
        start_date: &str,
        end_date: &str,
        viewer_telegram_id: i64,
    ) -> Result<Vec<RegistrationRollup>, sqlx::Error> {
        sqlx::query_as::<_, RegistrationRollup>(
            r#"
            SELECT training_date, training_time, chat_id,
                   SUM(CASE WHEN status = 'registered' THEN 1 ELSE 0 END) AS registered_count,
                   SUM(CASE WHEN status = 'waitlist' THEN 1 ELSE 0 END) AS waitlist_count,
                   MAX(CASE WHEN user_telegram_id = ? THEN status END) AS my_status
            FROM training_registrations
            WHERE training_date BETWEEN ? AND ?
            GROUP BY training_date, training_time, chat_id
            "#,
        )
        .bind(viewer_telegram_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await
    }
}
