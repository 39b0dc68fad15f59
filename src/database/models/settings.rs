use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::datetime::format_date_with_weekday;

const POLL_TEMPLATE_KEY: &str = "default_poll_template";

/// The poll question template and its fixed answer set. `{date}` and
/// `{time}` placeholders are substituted when a poll is posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollTemplate {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_options")]
    pub options: Vec<String>,
    #[serde(default = "default_training_day")]
    pub training_day: String,
    #[serde(default = "default_poll_day")]
    pub poll_day: String,
    #[serde(default = "default_training_time")]
    pub training_time: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub default_chat_id: String,
    #[serde(default)]
    pub default_topic_id: Option<i64>,
}

fn default_name() -> String {
    "Волейбольный опрос".to_string()
}

fn default_description() -> String {
    "Волейбол {date} {time}".to_string()
}

fn default_options() -> Vec<String> {
    vec!["Буду".to_string(), "Не буду".to_string(), "Возможно".to_string()]
}

fn default_training_day() -> String {
    "sunday".to_string()
}

fn default_poll_day() -> String {
    "friday".to_string()
}

fn default_training_time() -> String {
    "18:00".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for PollTemplate {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            options: default_options(),
            training_day: default_training_day(),
            poll_day: default_poll_day(),
            training_time: default_training_time(),
            enabled: default_enabled(),
            default_chat_id: String::new(),
            default_topic_id: None,
        }
    }
}

impl PollTemplate {
    /// Stored template, falling back to the defaults when nothing has
    /// been saved yet. Missing fields in an older stored value pick up
    /// their defaults via serde.
    pub async fn load(pool: &sqlx::SqlitePool) -> Result<Self, sqlx::Error> {
        match get_setting(pool, POLL_TEMPLATE_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
            None => Ok(Self::default()),
        }
    }

    pub async fn save(&self, pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
        let raw = serde_json::to_string(self).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        set_setting(pool, POLL_TEMPLATE_KEY, &raw).await
    }

    pub fn render(&self, training_date: NaiveDate, training_time: &str) -> String {
        self.description
            .replace("{date}", &format_date_with_weekday(training_date))
            .replace("{time}", training_time)
    }
}

pub async fn get_setting(
    pool: &sqlx::SqlitePool,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn set_setting(
    pool: &sqlx::SqlitePool,
    key: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, ?)",
    )
    .bind(key)
    .bind(value)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}
