use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::{get, put};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{
    ActivePoll, InviteCode, InviteCodeWithCreator, NewOneTimeTraining, NewSchedule,
    OneTimeTraining, PollSchedule, PollTemplate, ScheduleUpdate, User,
};
use crate::error::AppError;
use crate::utils::datetime::{parse_training_time, weekday_from_name};
use crate::web::auth::AdminUser;
use crate::web::calendar::month_bounds;
use crate::web::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/schedules", get(list_schedules).post(create_schedule))
        .route("/api/admin/schedules/:id", put(update_schedule).delete(delete_schedule))
        .route("/api/admin/template", get(get_template).put(put_template))
        .route("/api/admin/invites", get(list_invites).post(create_invite))
        .route("/api/admin/invites/:code", get(get_invite).delete(revoke_invite))
        .route("/api/admin/trainings", get(list_trainings).post(create_training))
        .route("/api/admin/trainings/:id", axum::routing::delete(delete_training))
        .route("/api/admin/users", get(list_users).post(add_user))
        .route("/api/admin/users/:telegram_id/active", put(set_user_active))
        .route("/api/admin/users/:telegram_id/admin", put(set_user_admin))
        .route("/api/admin/active-polls", get(list_active_polls))
}

// ---- schedules ----

async fn list_schedules(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<PollSchedule>>, AppError> {
    let schedules = PollSchedule::list_all(&state.db.pool).await?;
    Ok(Json(schedules))
}

async fn create_schedule(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(new): Json<NewSchedule>,
) -> Result<Json<PollSchedule>, AppError> {
    let schedule = PollSchedule::create(&state.db.pool, new).await?;
    tracing::info!("Admin {} created schedule {}", admin.telegram_id, schedule.id);
    Ok(Json(schedule))
}

async fn update_schedule(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(schedule_id): Path<String>,
    Json(update): Json<ScheduleUpdate>,
) -> Result<Json<PollSchedule>, AppError> {
    let schedule = PollSchedule::update(&state.db.pool, &schedule_id, update).await?;
    tracing::info!("Admin {} updated schedule {}", admin.telegram_id, schedule_id);
    Ok(Json(schedule))
}

async fn delete_schedule(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(schedule_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !PollSchedule::delete(&state.db.pool, &schedule_id).await? {
        return Err(AppError::NotFound(format!("schedule {schedule_id}")));
    }
    tracing::info!("Admin {} deleted schedule {}", admin.telegram_id, schedule_id);
    Ok(Json(json!({ "success": true })))
}

// ---- poll template ----

async fn get_template(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<PollTemplate>, AppError> {
    let template = PollTemplate::load(&state.db.pool).await?;
    Ok(Json(template))
}

async fn put_template(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(template): Json<PollTemplate>,
) -> Result<Json<PollTemplate>, AppError> {
    weekday_from_name(&template.training_day)?;
    weekday_from_name(&template.poll_day)?;
    parse_training_time(&template.training_time)?;
    if template.options.is_empty() {
        return Err(AppError::Validation("Poll options cannot be empty".into()));
    }

    template.save(&state.db.pool).await?;
    tracing::info!("Admin {} updated the poll template", admin.telegram_id);
    Ok(Json(template))
}

// ---- invite codes ----

#[derive(Debug, Deserialize)]
struct NewInviteRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

async fn list_invites(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<InviteCodeWithCreator>>, AppError> {
    let invites = InviteCode::list_all(&state.db.pool).await?;
    Ok(Json(invites))
}

async fn create_invite(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<NewInviteRequest>,
) -> Result<Json<InviteCode>, AppError> {
    let code = request.code.unwrap_or_else(InviteCode::generate_code);
    let invite =
        InviteCode::create(&state.db.pool, code, admin.telegram_id, request.expires_at).await?;
    tracing::info!("Admin {} created invite code {}", admin.telegram_id, invite.code);
    Ok(Json(invite))
}

async fn get_invite(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(code): Path<String>,
) -> Result<Json<InviteCode>, AppError> {
    let invite = InviteCode::find_by_code(&state.db.pool, &code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invite code {code}")))?;
    Ok(Json(invite))
}

async fn revoke_invite(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let revoked = InviteCode::revoke(&state.db.pool, &code).await?;
    tracing::info!(
        "Admin {} revoked invite code {}: {}",
        admin.telegram_id,
        code,
        revoked
    );
    Ok(Json(json!({ "success": revoked })))
}

// ---- one-time trainings ----

#[derive(Debug, Deserialize)]
struct TrainingsQuery {
    year: i32,
    month: u32,
}

async fn list_trainings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<TrainingsQuery>,
) -> Result<Json<Vec<OneTimeTraining>>, AppError> {
    let (start, end) = month_bounds(query.year, query.month)?;
    let trainings = OneTimeTraining::list_for_period(
        &state.db.pool,
        &start.format("%Y-%m-%d").to_string(),
        &end.format("%Y-%m-%d").to_string(),
    )
    .await?;
    Ok(Json(trainings))
}

async fn create_training(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(new): Json<NewOneTimeTraining>,
) -> Result<Json<OneTimeTraining>, AppError> {
    let training = OneTimeTraining::create(&state.db.pool, new).await?;
    tracing::info!(
        "Admin {} created one-time training {}",
        admin.telegram_id,
        training.id
    );
    Ok(Json(training))
}

async fn delete_training(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(training_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    OneTimeTraining::delete(&state.db.pool, &training_id).await?;
    tracing::info!(
        "Admin {} deleted one-time training {}",
        admin.telegram_id,
        training_id
    );
    Ok(Json(json!({ "success": true })))
}

// ---- user roster ----

#[derive(Debug, Deserialize)]
struct AddUserRequest {
    telegram_id: i64,
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct SetAdminRequest {
    is_admin: bool,
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = User::list_all(&state.db.pool).await?;
    Ok(Json(users))
}

async fn add_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<AddUserRequest>,
) -> Result<Json<User>, AppError> {
    let user = User::add_by_telegram_id(&state.db.pool, request.telegram_id).await?;
    tracing::info!(
        "Admin {} added user {} to the roster",
        admin.telegram_id,
        request.telegram_id
    );
    Ok(Json(user))
}

async fn set_user_active(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(telegram_id): Path<i64>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<Value>, AppError> {
    if !User::set_active(&state.db.pool, telegram_id, request.is_active).await? {
        return Err(AppError::NotFound(format!("user {telegram_id}")));
    }
    tracing::info!(
        "Admin {} set user {} active={}",
        admin.telegram_id,
        telegram_id,
        request.is_active
    );
    Ok(Json(json!({ "success": true, "is_active": request.is_active })))
}

async fn set_user_admin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(telegram_id): Path<i64>,
    Json(request): Json<SetAdminRequest>,
) -> Result<Json<Value>, AppError> {
    if !User::set_admin(&state.db.pool, telegram_id, request.is_admin).await? {
        return Err(AppError::NotFound(format!("user {telegram_id}")));
    }
    tracing::info!(
        "Admin {} set user {} admin={}",
        admin.telegram_id,
        telegram_id,
        request.is_admin
    );
    Ok(Json(json!({ "success": true, "is_admin": request.is_admin })))
}

// ---- published polls ----

async fn list_active_polls(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<ActivePoll>>, AppError> {
    let polls = ActivePoll::list_all(&state.db.pool).await?;
    Ok(Json(polls))
}
