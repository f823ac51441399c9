//! Input validation for account payloads

use common::account::{validate_line_user_id, validate_password, validate_profile};

use crate::models::{LineRegisterRequest, RegisterRequest};

/// Validate a self-registration payload
pub fn validate_registration(req: &RegisterRequest) -> Result<(), String> {
    validate_profile(
        &req.id,
        &req.name,
        &req.national_id,
        &req.professional_id,
        &req.department,
    )?;
    validate_password(&req.password)
}

/// Validate a LINE registration payload
pub fn validate_line_registration(req: &LineRegisterRequest) -> Result<(), String> {
    validate_profile(
        &req.id,
        &req.name,
        &req.national_id,
        &req.professional_id,
        &req.department,
    )?;
    validate_line_user_id(&req.line_user_id)
}
