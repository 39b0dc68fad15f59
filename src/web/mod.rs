pub mod admin;
pub mod auth;
pub mod calendar;

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::database::connection::DatabaseManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub config: Arc<Config>,
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseManager>, config: Arc<Config>) -> Self {
        Self {
            db,
            config,
            start_time: Utc::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/telegram", post(auth::auth_telegram))
        .route("/api/auth/me", get(auth::me))
        .route("/api/calendar", get(calendar::month_calendar))
        .route("/api/calendar/register", post(calendar::register))
        .route("/api/calendar/unregister", post(calendar::unregister))
        .route("/api/calendar/roster", get(calendar::occurrence_roster))
        .route("/api/my-trainings", get(calendar::my_trainings))
        .merge(admin::router())
        .merge(crate::services::health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
