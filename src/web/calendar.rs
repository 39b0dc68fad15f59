use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::{
    OccurrenceKey, OccurrenceRegistration, OneTimeTraining, PollSchedule, Registration,
    RegistrationStatus,
};
use crate::error::AppError;
use crate::utils::datetime::{parse_training_time, weekday_from_name};
use crate::utils::validation::{validate_chat_id, validate_training_date};
use crate::web::auth::AuthUser;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

/// One projected training in the calendar: either an instance of a
/// recurring schedule or a one-time training, with sign-up counts and
/// the viewer's own status attached.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarOccurrence {
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    pub topic_id: Option<i64>,
    pub name: Option<String>,
    pub source: &'static str,
    pub schedule_id: Option<String>,
    pub training_id: Option<String>,
    pub registered_count: i64,
    pub waitlist_count: i64,
    pub my_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub occurrences: Vec<CalendarOccurrence>,
}

#[derive(Debug, Deserialize)]
pub struct OccurrenceRequest {
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
    #[serde(default)]
    pub topic_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub status: RegistrationStatus,
}

pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    if !(2000..=2100).contains(&year) {
        return Err(AppError::Validation(format!("Invalid year: {year}")));
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("Invalid month: {month}")))?;

    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next_month
        .map(|d| d - chrono::Duration::days(1))
        .ok_or_else(|| AppError::Validation(format!("Invalid month: {month}")))?;

    Ok((start, end))
}

/// The occurrence view: enabled schedules projected onto every
/// matching date of the period, unioned with one-time trainings.
/// Recomputed on every read so schedule edits show up immediately.
pub fn project_period(
    schedules: &[PollSchedule],
    one_time: &[OneTimeTraining],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CalendarOccurrence> {
    let mut occurrences = Vec::new();

    for schedule in schedules.iter().filter(|s| s.enabled) {
        let Ok(weekday) = weekday_from_name(&schedule.training_day) else {
            continue;
        };

        let mut date = start;
        while date.weekday() != weekday {
            date += chrono::Duration::days(1);
        }
        while date <= end {
            occurrences.push(CalendarOccurrence {
                training_date: date.format("%Y-%m-%d").to_string(),
                training_time: schedule.training_time.clone(),
                chat_id: schedule.chat_id.clone(),
                topic_id: schedule.topic_id,
                name: Some(schedule.name.clone()),
                source: "schedule",
                schedule_id: Some(schedule.id.clone()),
                training_id: None,
                registered_count: 0,
                waitlist_count: 0,
                my_status: None,
            });
            date += chrono::Duration::days(7);
        }
    }

    for training in one_time {
        occurrences.push(CalendarOccurrence {
            training_date: training.training_date.clone(),
            training_time: training.training_time.clone(),
            chat_id: training.chat_id.clone(),
            topic_id: training.topic_id,
            name: training.name.clone(),
            source: "one_time",
            schedule_id: None,
            training_id: Some(training.id.clone()),
            registered_count: 0,
            waitlist_count: 0,
            my_status: None,
        });
    }

    occurrences.sort_by(|a, b| {
        (&a.training_date, &a.training_time, &a.chat_id)
            .cmp(&(&b.training_date, &b.training_time, &b.chat_id))
    });

    occurrences
}

pub async fn month_calendar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let (start, end) = month_bounds(query.year, query.month)?;
    let start_str = start.format("%Y-%m-%d").to_string();
    let end_str = end.format("%Y-%m-%d").to_string();

    let schedules = PollSchedule::list_all(&state.db.pool).await?;
    let one_time = OneTimeTraining::list_for_period(&state.db.pool, &start_str, &end_str).await?;
    let mut occurrences = project_period(&schedules, &one_time, start, end);

    let rollups =
        Registration::rollups_for_period(&state.db.pool, &start_str, &end_str, user.telegram_id)
            .await?;
    let by_key: HashMap<(String, String, String), _> = rollups
        .into_iter()
        .map(|r| {
            (
                (r.training_date.clone(), r.training_time.clone(), r.chat_id.clone()),
                r,
            )
        })
        .collect();

    for occurrence in &mut occurrences {
        let key = (
            occurrence.training_date.clone(),
            occurrence.training_time.clone(),
            occurrence.chat_id.clone(),
        );
        if let Some(rollup) = by_key.get(&key) {
            occurrence.registered_count = rollup.registered_count;
            occurrence.waitlist_count = rollup.waitlist_count;
            occurrence.my_status = rollup.my_status.clone();
        }
    }

    Ok(Json(CalendarResponse {
        year: query.year,
        month: query.month,
        occurrences,
    }))
}

fn occurrence_key(request: &OccurrenceRequest) -> Result<OccurrenceKey, AppError> {
    validate_training_date(&request.training_date)?;
    parse_training_time(&request.training_time)?;
    validate_chat_id(&request.chat_id)?;

    Ok(OccurrenceKey {
        training_date: request.training_date.trim().to_string(),
        training_time: request.training_time.trim().to_string(),
        chat_id: request.chat_id.trim().to_string(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<OccurrenceRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let key = occurrence_key(&request)?;

    let status =
        Registration::register(&state.db.pool, &key, request.topic_id, user.telegram_id).await?;

    tracing::info!(
        "User {} registered for {} {} in chat {}: {}",
        user.telegram_id,
        key.training_date,
        key.training_time,
        key.chat_id,
        status.as_str()
    );

    Ok(Json(RegisterResponse {
        success: true,
        status,
    }))
}

pub async fn unregister(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<OccurrenceRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = occurrence_key(&request)?;

    Registration::unregister(&state.db.pool, &key, user.telegram_id).await?;

    tracing::info!(
        "User {} unregistered from {} {} in chat {}",
        user.telegram_id,
        key.training_date,
        key.training_time,
        key.chat_id
    );

    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn my_trainings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Registration>>, AppError> {
    let trainings = Registration::list_for_user(&state.db.pool, user.telegram_id).await?;
    Ok(Json(trainings))
}

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub training_date: String,
    pub training_time: String,
    pub chat_id: String,
}

pub async fn occurrence_roster(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<RosterQuery>,
) -> Result<Json<Vec<OccurrenceRegistration>>, AppError> {
    let key = OccurrenceKey {
        training_date: query.training_date,
        training_time: query.training_time,
        chat_id: query.chat_id,
    };

    let roster = Registration::list_for_occurrence(&state.db.pool, &key).await?;
    Ok(Json(roster))
}
