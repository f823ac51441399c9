//! Error type for the HR service and its mapping onto HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::assistant::AssistantError;
use crate::leave::LeaveError;
use crate::ledger::LedgerError;
use crate::models::SettingsError;
use crate::timeclock::PunchError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Rejected input, with a machine-readable code
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    /// The request conflicts with current state
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("device location is unavailable")]
    LocationUnavailable,

    #[error("outside the check-in area: {distance_meters} m from the office, limit {radius_meters} m")]
    OutsideGeofence {
        distance_meters: u64,
        radius_meters: u64,
    },

    #[error("Internal server error")]
    InternalServerError,

    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl ApiError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code,
            message: message.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation { code, .. } | ApiError::Conflict { code, .. } => *code,
            ApiError::LocationUnavailable => "LOCATION_UNAVAILABLE",
            ApiError::OutsideGeofence { .. } => "OUTSIDE_GEOFENCE",
            ApiError::InternalServerError | ApiError::Database(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::LocationUnavailable | ApiError::OutsideGeofence { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
            ApiError::OutsideGeofence {
                distance_meters,
                radius_meters,
            } => json!({
                "error": self.to_string(),
                "code": code,
                "distance_meters": distance_meters,
                "radius_meters": radius_meters,
            }),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                json!({ "error": "Database error", "code": code })
            }
            _ => json!({ "error": self.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AlreadyCheckedIn => {
                ApiError::conflict("ALREADY_CHECKED_IN", err.to_string())
            }
            LedgerError::NotCheckedIn => ApiError::conflict("NOT_CHECKED_IN", err.to_string()),
            LedgerError::AlreadyCheckedOut => {
                ApiError::conflict("ALREADY_CHECKED_OUT", err.to_string())
            }
            LedgerError::NotFound => ApiError::NotFound(err.to_string()),
            LedgerError::InvalidAmendment(_) => {
                ApiError::validation("INVALID_AMENDMENT", err.to_string())
            }
            LedgerError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<PunchError> for ApiError {
    fn from(err: PunchError) -> Self {
        match err {
            PunchError::LocationUnavailable => ApiError::LocationUnavailable,
            PunchError::InvalidCoordinate(c) => {
                ApiError::validation("INVALID_COORDINATE", c.to_string())
            }
            PunchError::OutsideGeofence {
                distance_meters,
                radius_meters,
            } => ApiError::OutsideGeofence {
                distance_meters,
                radius_meters,
            },
            PunchError::Ledger(e) => e.into(),
            PunchError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<LeaveError> for ApiError {
    fn from(err: LeaveError) -> Self {
        match err {
            LeaveError::InvalidRange { .. } => {
                ApiError::validation("INVALID_RANGE", err.to_string())
            }
            LeaveError::EmptyReason => ApiError::validation("EMPTY_REASON", err.to_string()),
            LeaveError::InvalidTransition { .. } => {
                ApiError::validation("INVALID_TRANSITION", err.to_string())
            }
            LeaveError::NotFound => ApiError::NotFound(err.to_string()),
            LeaveError::Forbidden => ApiError::Forbidden(err.to_string()),
            LeaveError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        ApiError::validation("INVALID_SETTINGS", err.to_string())
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::EmptyPrompt => ApiError::validation("EMPTY_PROMPT", err.to_string()),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn state_conflicts_are_409_with_codes() {
        let (status, body) = body_of(LedgerError::AlreadyCheckedIn.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_CHECKED_IN");

        let (status, body) = body_of(LedgerError::NotCheckedIn.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NOT_CHECKED_IN");
    }

    #[tokio::test]
    async fn geofence_outcomes_are_distinct() {
        let (status, body) = body_of(PunchError::LocationUnavailable.into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "LOCATION_UNAVAILABLE");

        let (status, body) = body_of(
            PunchError::OutsideGeofence {
                distance_meters: 15_945,
                radius_meters: 200,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "OUTSIDE_GEOFENCE");
        assert_eq!(body["distance_meters"], 15_945);
        assert_eq!(body["radius_meters"], 200);
    }

    #[tokio::test]
    async fn leave_errors_map_to_their_categories() {
        use crate::models::LeaveStatus;

        let (status, _) = body_of(LeaveError::EmptyReason.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = body_of(
            LeaveError::InvalidTransition {
                from: LeaveStatus::Approved,
                to: LeaveStatus::Rejected,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_TRANSITION");

        let (status, _) = body_of(LeaveError::Forbidden.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = body_of(LeaveError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn storage_details_stay_out_of_the_body() {
        let err = common::error::DatabaseError::Decode("leave status: Holiday".to_string());
        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error");
    }
}
