use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::response::Json;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::database::models::{InviteCode, User, UserProfile};
use crate::error::AppError;
use crate::web::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Login Widget payloads older than this are rejected as replays.
const AUTH_DATE_MAX_AGE_SECS: i64 = 300;
/// Session tokens live for a week.
const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Payload of the Telegram Login Widget, plus an optional invite code
/// for users not yet on the roster.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramLoginRequest {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub auth_date: i64,
    pub hash: String,
    #[serde(default)]
    pub invite_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

/// Checks the Login Widget signature: the data-check string is the
/// sorted `key=value` lines of all present fields, the key is
/// SHA256(bot token), the signature HMAC-SHA256 in hex.
pub fn verify_login_hash(bot_token: &str, login: &TelegramLoginRequest) -> bool {
    let mut fields: Vec<(&str, String)> = vec![
        ("auth_date", login.auth_date.to_string()),
        ("first_name", login.first_name.clone()),
        ("id", login.id.to_string()),
    ];
    if let Some(value) = &login.last_name {
        fields.push(("last_name", value.clone()));
    }
    if let Some(value) = &login.photo_url {
        fields.push(("photo_url", value.clone()));
    }
    if let Some(value) = &login.username {
        fields.push(("username", value.clone()));
    }
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let data_check = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret = Sha256::digest(bot_token.as_bytes());
    let mut mac = match HmacSha256::new_from_slice(&secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(data_check.as_bytes());

    let Ok(received) = hex::decode(&login.hash) else {
        return false;
    };

    mac.verify_slice(&received).is_ok()
}

fn sign(secret: &str, payload: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Opaque session token: `<telegram_id>.<expiry>.<signature>`.
pub fn issue_session_token(secret: &str, telegram_id: i64) -> String {
    let expires = Utc::now().timestamp() + SESSION_TTL_SECS;
    let payload = format!("{telegram_id}.{expires}");
    let signature = sign(secret, &payload).unwrap_or_default();
    format!("{payload}.{signature}")
}

/// Returns the telegram id of a valid, unexpired token.
pub fn verify_session_token(secret: &str, token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let telegram_id: i64 = parts.next()?.parse().ok()?;
    let expires: i64 = parts.next()?.parse().ok()?;
    let signature = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let payload = format!("{telegram_id}.{expires}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    let received = hex::decode(signature).ok()?;
    mac.verify_slice(&received).ok()?;

    if expires <= Utc::now().timestamp() {
        return None;
    }

    Some(telegram_id)
}

/// Extractor for any active, authenticated user.
pub struct AuthUser(pub User);

/// Extractor for authenticated admins.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let telegram_id = verify_session_token(&state.config.session_secret, token)
            .ok_or(AppError::Unauthorized)?;

        let user = User::find_by_telegram_id(&state.db.pool, telegram_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Forbidden);
        }

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}

/// Telegram Login Widget sign-in. Known active users log straight in;
/// unknown (or deactivated) users must present a usable invite code,
/// which is consumed on success.
pub async fn auth_telegram(
    State(state): State<AppState>,
    Json(login): Json<TelegramLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if !verify_login_hash(&state.config.telegram_bot_token, &login) {
        tracing::warn!("Rejected login with a bad signature for user {}", login.id);
        return Err(AppError::Unauthorized);
    }

    if Utc::now().timestamp() - login.auth_date > AUTH_DATE_MAX_AGE_SECS {
        tracing::warn!("Rejected stale login data for user {}", login.id);
        return Err(AppError::Unauthorized);
    }

    let profile = UserProfile {
        telegram_id: login.id,
        first_name: login.first_name.clone(),
        last_name: login.last_name.clone(),
        username: login.username.clone(),
        photo_url: login.photo_url.clone(),
    };

    let existing = User::find_by_telegram_id(&state.db.pool, login.id).await?;

    let user = match existing {
        Some(user) if user.is_active => User::upsert_from_login(&state.db.pool, &profile).await?,
        _ => {
            let code = login.invite_code.as_deref().ok_or(AppError::Forbidden)?;

            if !InviteCode::consume(&state.db.pool, code, login.id).await? {
                tracing::warn!("Rejected unusable invite code for user {}", login.id);
                return Err(AppError::Forbidden);
            }

            let user = User::upsert_from_login(&state.db.pool, &profile).await?;
            if user.is_active {
                user
            } else {
                User::set_active(&state.db.pool, login.id, true).await?;
                User::find_by_telegram_id(&state.db.pool, login.id)
                    .await?
                    .ok_or(AppError::Unauthorized)?
            }
        }
    };

    tracing::info!(
        "User {} ({}) logged in",
        user.telegram_id,
        user.username.as_deref().unwrap_or("-")
    );

    let token = issue_session_token(&state.config.session_secret, user.telegram_id);

    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_round_trip() {
        let token = issue_session_token("secret", 42);
        assert_eq!(verify_session_token("secret", &token), Some(42));
    }

    #[test]
    fn test_session_token_wrong_secret() {
        let token = issue_session_token("secret", 42);
        assert_eq!(verify_session_token("other", &token), None);
    }

    #[test]
    fn test_session_token_tampered_id() {
        let token = issue_session_token("secret", 42);
        let tampered = token.replacen("42", "43", 1);
        assert_eq!(verify_session_token("secret", &tampered), None);
    }

    #[test]
    fn test_session_token_garbage() {
        assert_eq!(verify_session_token("secret", ""), None);
        assert_eq!(verify_session_token("secret", "not.a.token"), None);
        assert_eq!(verify_session_token("secret", "1.2"), None);
    }

    fn signed_login(bot_token: &str, mut login: TelegramLoginRequest) -> TelegramLoginRequest {
        let mut fields: Vec<(&str, String)> = vec![
            ("auth_date", login.auth_date.to_string()),
            ("first_name", login.first_name.clone()),
            ("id", login.id.to_string()),
        ];
        if let Some(v) = &login.last_name {
            fields.push(("last_name", v.clone()));
        }
        if let Some(v) = &login.photo_url {
            fields.push(("photo_url", v.clone()));
        }
        if let Some(v) = &login.username {
            fields.push(("username", v.clone()));
        }
        fields.sort_by(|a, b| a.0.cmp(b.0));
        let data_check = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let secret = Sha256::digest(bot_token.as_bytes());
        let mut mac = HmacSha256::new_from_slice(&secret).unwrap();
        mac.update(data_check.as_bytes());
        login.hash = hex::encode(mac.finalize().into_bytes());
        login
    }

    #[test]
    fn test_verify_login_hash() {
        let login = signed_login(
            "123:token",
            TelegramLoginRequest {
                id: 7,
                first_name: "Anna".to_string(),
                last_name: None,
                username: Some("anna".to_string()),
                photo_url: None,
                auth_date: 1_700_000_000,
                hash: String::new(),
                invite_code: None,
            },
        );

        assert!(verify_login_hash("123:token", &login));
        assert!(!verify_login_hash("wrong:token", &login));

        let mut tampered = login;
        tampered.id = 8;
        assert!(!verify_login_hash("123:token", &tampered));
    }
}
