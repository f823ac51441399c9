//! Chat assistant endpoint

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    assistant::{AssistantError, UserContext},
    error::ApiResult,
    models::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.prompt.trim().is_empty() {
        return Err(AssistantError::EmptyPrompt.into());
    }

    let context = UserContext::gather(
        &state.user_repository,
        &state.leave_repository,
        &state.time_log_repository,
        &user.id,
    )
    .await?;

    let reply = state
        .assistant
        .chat(&context, &payload.prompt, state.today())
        .await?;

    Ok(Json(json!({ "reply": reply })))
}
