//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{
    account::{hash_password, random_secret, verify_password},
    claims::{Claims, TokenType},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    jwt::TokenPair,
    middleware::auth_middleware,
    models::{LineRegisterRequest, LoginCredentials, NewUser, RegisterRequest, User},
    validation,
};

/// Request for token refresh or logout
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// A signed-in user with fresh tokens
#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/line/:line_user_id", get(line_lookup))
        .route("/auth/line-register", post(line_register))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);
    let redis = state.sessions.health_check().await.unwrap_or(false);

    Json(json!({
        "status": if database && redis { "ok" } else { "degraded" },
        "service": "auth-service",
        "database": database,
        "redis": redis,
    }))
}

/// Issue tokens for `user` and make the refresh token the live session
async fn start_session(state: &AppState, user: User) -> AuthResult<SessionResponse> {
    let tokens = state.jwt_service.issue(&user)?;
    let refresh = state.jwt_service.validate_token(&tokens.refresh_token)?;
    state.sessions.store(&refresh).await?;

    Ok(SessionResponse { user, tokens })
}

/// Employee self-registration
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    validation::validate_registration(&payload).map_err(AuthError::Validation)?;

    if state
        .user_repository
        .exists(&payload.id, &payload.national_id)
        .await?
    {
        return Err(AuthError::DuplicateUser);
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .user_repository
        .create(&NewUser::from(&payload), &password_hash)
        .await?;

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> AuthResult<impl IntoResponse> {
    info!(user_id = %payload.user_id, "Login attempt");

    if !state.rate_limiter.is_allowed(&payload.user_id).await {
        return Err(AuthError::TooManyAttempts);
    }

    let user = state
        .user_repository
        .find_by_id(&payload.user_id)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&user.password_hash, &payload.password)? {
        warn!(target: "audit", user_id = %user.id, "Failed login");
        return Err(AuthError::InvalidCredentials);
    }

    state.rate_limiter.reset(&payload.user_id).await;
    Ok(Json(start_session(&state, user).await?))
}

/// Look up the account linked to a LINE identity and sign it in
pub async fn line_lookup(
    State(state): State<AppState>,
    Path(line_user_id): Path<String>,
) -> AuthResult<impl IntoResponse> {
    let Some(user) = state
        .user_repository
        .find_by_line_user_id(&line_user_id)
        .await?
    else {
        return Ok(Json(json!({ "exists": false })));
    };

    let session = start_session(&state, user).await?;
    let mut body = serde_json::to_value(&session).map_err(anyhow::Error::from)?;
    body["exists"] = json!(true);

    Ok(Json(body))
}

/// Register through a LINE identity; the account gets no usable password
pub async fn line_register(
    State(state): State<AppState>,
    Json(payload): Json<LineRegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    validation::validate_line_registration(&payload).map_err(AuthError::Validation)?;

    if state
        .user_repository
        .exists(&payload.id, &payload.national_id)
        .await?
    {
        return Err(AuthError::DuplicateUser);
    }

    let password_hash = hash_password(&random_secret())?;
    let user = state
        .user_repository
        .create(&NewUser::from(&payload), &password_hash)
        .await?;

    info!(user_id = %user.id, "User registered through LINE");
    Ok((StatusCode::CREATED, Json(start_session(&state, user).await?)))
}

/// Validate a refresh token that is neither spent nor superseded
async fn live_refresh_claims(state: &AppState, token: &str) -> AuthResult<Claims> {
    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|_| AuthError::Unauthorized)?;

    if claims.token_type != TokenType::Refresh {
        return Err(AuthError::Unauthorized);
    }

    if state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, &claims)
        .await?
    {
        warn!(target: "audit", user_id = %claims.sub, "Blacklisted refresh token presented");
        return Err(AuthError::Unauthorized);
    }

    if !state.sessions.is_current(&claims).await? {
        return Err(AuthError::Unauthorized);
    }

    Ok(claims)
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    let claims = live_refresh_claims(&state, &payload.refresh_token).await?;

    // Reload so role changes made by an admin reach the new access token
    let user = state
        .user_repository
        .find_by_id(&claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    let tokens = state
        .jwt_service
        .rotate_refresh_token(&state.redis_pool, &user, &claims)
        .await?;
    let refresh = state.jwt_service.validate_token(&tokens.refresh_token)?;
    state.sessions.store(&refresh).await?;

    Ok(Json(tokens))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    let claims = live_refresh_claims(&state, &payload.refresh_token).await?;

    state
        .jwt_service
        .blacklist_token(&state.redis_pool, &claims)
        .await?;

    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        if let Ok(access) = state.jwt_service.validate_token(bearer.token()) {
            if access.sub == claims.sub {
                state
                    .jwt_service
                    .blacklist_token(&state.redis_pool, &access)
                    .await?;
            }
        }
    }

    state.sessions.delete(&claims.sub).await?;
    info!(user_id = %claims.sub, "User logged out");

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// The signed-in user
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {} not found", claims.sub)))?;

    Ok(Json(user))
}
