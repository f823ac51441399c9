//! HR service routes

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use crate::{
    middleware::{auth_middleware, require_admin},
    state::AppState,
};

mod admin;
mod assistant;
mod leave;
mod timelog;

/// Create the router for the HR service
pub fn create_router(state: AppState) -> Router {
    let admin_only = || middleware::from_fn_with_state(state.clone(), require_admin);

    let protected_routes = Router::new()
        .route("/timelog/today", get(timelog::today))
        .route("/timelog/check-in", post(timelog::check_in))
        .route("/timelog/check-out", put(timelog::check_out))
        .route("/timelog/mine", get(timelog::mine))
        .route("/timelog/all", get(timelog::all).route_layer(admin_only()))
        .route("/timelog/:id", put(timelog::amend).route_layer(admin_only()))
        .route("/leave", post(leave::create))
        .route("/leave/my-requests", get(leave::my_requests))
        .route("/leave/pending-approvals", get(leave::pending_approvals))
        .route("/leave/:id/status", put(leave::decide))
        .route(
            "/admin/settings",
            get(admin::get_settings)
                .merge(put(admin::update_settings).route_layer(admin_only())),
        )
        .route(
            "/admin/roles",
            get(admin::list_roles)
                .post(admin::create_role)
                .route_layer(admin_only()),
        )
        .route(
            "/admin/roles/:name",
            put(admin::update_role)
                .delete(admin::delete_role)
                .route_layer(admin_only()),
        )
        .route("/admin/dashboard-stats", get(admin::dashboard_stats))
        .route(
            "/users",
            get(admin::list_users)
                .post(admin::create_user)
                .route_layer(admin_only()),
        )
        .route("/users/:id", put(admin::update_user).route_layer(admin_only()))
        .route("/assistant/chat", post(assistant::chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "hr-service",
        "database": database,
    }))
}
