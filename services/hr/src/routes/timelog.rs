//! Attendance endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{AmendTimeLogRequest, AuthUser, PageQuery, PunchRequest},
    state::AppState,
};

/// The caller's log for today, or null
pub async fn today(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let log = state
        .time_clock
        .ledger()
        .get_today_log(&user.id, state.today())
        .await?;

    Ok(Json(log))
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PunchRequest>,
) -> ApiResult<impl IntoResponse> {
    let punched = state
        .time_clock
        .check_in(&user.id, state.today(), payload.location)
        .await?;

    Ok(Json(punched))
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PunchRequest>,
) -> ApiResult<impl IntoResponse> {
    let punched = state
        .time_clock
        .check_out(&user.id, state.today(), payload.location)
        .await?;

    Ok(Json(punched))
}

/// The caller's recent days, newest first
pub async fn mine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let logs = state
        .time_clock
        .ledger()
        .history(&user.id, state.config.attendance.history_limit)
        .await?;

    Ok(Json(logs))
}

/// Every log, newest first (admin)
pub async fn all(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let logs = state.time_clock.ledger().list_all().await?;
    Ok(Json(page.apply(logs)))
}

/// Correct a day's timestamps (admin)
pub async fn amend(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AmendTimeLogRequest>,
) -> ApiResult<impl IntoResponse> {
    let log = state
        .time_clock
        .ledger()
        .amend(id, payload.check_in, payload.check_out)
        .await?;

    tracing::info!(target: "audit", actor_id = %admin.id, log_id = %id, "time log amended by admin");
    Ok(Json(log))
}
