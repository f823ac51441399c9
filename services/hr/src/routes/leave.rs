//! Leave request endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    models::{AuthUser, CreateLeaveRequest, DecideLeaveRequest, PageQuery},
    state::AppState,
};

/// Submit a leave request for the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateLeaveRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = state
        .leave
        .create(
            &user.id,
            payload.leave_type,
            payload.start_date,
            payload.end_date,
            &payload.reason,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn my_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let requests = state.leave.list_mine(&user.id).await?;
    Ok(Json(page.apply(requests)))
}

pub async fn pending_approvals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let requests = state.leave.list_pending_for(&user).await?;
    Ok(Json(page.apply(requests)))
}

/// Approve or reject a pending request
pub async fn decide(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideLeaveRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = state.leave.decide(id, &user, payload.status).await?;
    Ok(Json(request))
}
