//! Settings, roles, users and dashboard endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::account::{hash_password, random_secret};
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    models::{
        AuthUser, ProvisionUserRequest, RoleType, SystemSettings, UpdateRole, UpdateUserRequest,
    },
    repositories::{SettingsStore, UserDirectory},
    state::AppState,
};

/// Current geofence settings; readable by any signed-in user
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let settings = state.settings_repository.get().await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(payload): Json<SystemSettings>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let settings = state.settings_repository.put(&payload).await?;
    info!(
        target: "audit",
        actor_id = %admin.id,
        latitude = settings.office_location.latitude,
        longitude = settings.office_location.longitude,
        radius_meters = settings.check_in_radius_meters,
        "system settings updated"
    );

    Ok(Json(settings))
}

pub async fn list_roles(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let roles = state.role_repository.list().await?;
    Ok(Json(roles))
}

fn validate_role_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("INVALID_ROLE", "role name is required"));
    }
    Ok(name)
}

pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<RoleType>,
) -> ApiResult<impl IntoResponse> {
    let role = RoleType {
        name: validate_role_name(&payload.name)?.to_string(),
        level: payload.level,
    };

    let created = state.role_repository.create(&role).await.map_err(|e| {
        if e.is_unique_violation() {
            ApiError::conflict("DUPLICATE_ROLE", format!("role {} already exists", role.name))
        } else {
            e.into()
        }
    })?;

    info!(role = %created.name, level = created.level, "role created");
    Ok((StatusCode::CREATED, Json(created)))
}

fn admin_role_protected(admin_role: &str) -> ApiError {
    ApiError::conflict(
        "ADMIN_ROLE_PROTECTED",
        format!("role {} grants admin access and cannot be renamed or deleted", admin_role),
    )
}

/// The role that grants admin access may change level but never its name
fn guard_admin_role(admin_role: &str, target: &str, renamed_to: Option<&str>) -> ApiResult<()> {
    match renamed_to {
        Some(new_name) if target == admin_role && new_name != admin_role => {
            Err(admin_role_protected(admin_role))
        }
        _ => Ok(()),
    }
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateRole>,
) -> ApiResult<impl IntoResponse> {
    let update = UpdateRole {
        name: payload
            .name
            .as_deref()
            .map(validate_role_name)
            .transpose()?
            .map(str::to_string),
        level: payload.level,
    };
    guard_admin_role(
        &state.config.authority.admin_role,
        &name,
        update.name.as_deref(),
    )?;

    let updated = state
        .role_repository
        .update(&name, &update)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::conflict("DUPLICATE_ROLE", "a role with that name already exists")
            } else {
                e.into()
            }
        })?
        .ok_or_else(|| ApiError::NotFound(format!("role {} not found", name)))?;

    info!(from = %name, role = %updated.name, level = updated.level, "role updated");
    Ok(Json(updated))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if name == state.config.authority.admin_role {
        return Err(admin_role_protected(&name));
    }

    let deleted = state.role_repository.delete(&name).await.map_err(|e| {
        if e.is_foreign_key_violation() {
            ApiError::conflict("ROLE_IN_USE", format!("role {} is still assigned to users", name))
        } else {
            e.into()
        }
    })?;

    if !deleted {
        return Err(ApiError::NotFound(format!("role {} not found", name)));
    }

    info!(role = %name, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Figures over the caller's team
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let stats = state.dashboard.stats(&user, state.today()).await?;
    Ok(Json(stats))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_repository.list_all().await?;
    Ok(Json(users))
}

/// Provision an account on behalf of an employee
pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Json(payload): Json<ProvisionUserRequest>,
) -> ApiResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|message| ApiError::validation("INVALID_USER", message))?;

    if !state.role_repository.exists(&payload.role).await? {
        return Err(ApiError::validation(
            "UNKNOWN_ROLE",
            format!("role {} does not exist", payload.role),
        ));
    }

    let secret = payload.password.clone().unwrap_or_else(random_secret);
    let password_hash = hash_password(&secret).map_err(|e| {
        error!("Failed to hash password: {:#}", e);
        ApiError::InternalServerError
    })?;

    let user = state
        .user_repository
        .create(&payload, &password_hash)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::conflict(
                    "DUPLICATE_USER",
                    "an account with this employee id, national id or LINE id already exists",
                )
            } else if e.is_foreign_key_violation() {
                ApiError::validation("UNKNOWN_USER", "supervisor or manager does not exist")
            } else {
                e.into()
            }
        })?;

    info!(
        target: "audit",
        actor_id = %admin.id,
        user_id = %user.id,
        role = %user.role,
        "user provisioned"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

/// Reassign a user's role and reporting lines
pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.role_repository.exists(&payload.role).await? {
        return Err(ApiError::validation(
            "UNKNOWN_ROLE",
            format!("role {} does not exist", payload.role),
        ));
    }

    let user = state
        .user_repository
        .update_assignment(&id, &payload)
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                ApiError::validation("UNKNOWN_USER", "supervisor or manager does not exist")
            } else {
                e.into()
            }
        })?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))?;

    info!(
        target: "audit",
        actor_id = %admin.id,
        user_id = %user.id,
        role = %user.role,
        "user assignment updated"
    );
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_cannot_be_renamed() {
        let renamed = guard_admin_role("Administrator", "Administrator", Some("Owner"));
        assert!(matches!(
            renamed,
            Err(ApiError::Conflict { code: "ADMIN_ROLE_PROTECTED", .. })
        ));
    }

    #[test]
    fn admin_role_level_can_still_change() {
        assert!(guard_admin_role("Administrator", "Administrator", None).is_ok());
        assert!(guard_admin_role("Administrator", "Administrator", Some("Administrator")).is_ok());
    }

    #[test]
    fn other_roles_are_unrestricted() {
        assert!(guard_admin_role("Administrator", "Supervisor", Some("Team Lead")).is_ok());
        assert!(guard_admin_role("Administrator", "Supervisor", None).is_ok());
    }
}
