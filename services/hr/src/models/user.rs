//! Employee records as seen by the HR service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity; password material stays in the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub national_id: String,
    pub professional_id: String,
    pub department: String,
    pub avatar: String,
    pub role: String,
    pub supervisor_id: Option<String>,
    pub manager_id: Option<String>,
    pub line_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated caller, taken from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: String,
}

/// Admin replacement of a user's role and reporting lines
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub role: String,
    pub supervisor_id: Option<String>,
    pub manager_id: Option<String>,
}

/// Admin provisioning of a new account
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionUserRequest {
    pub id: String,
    pub name: String,
    pub national_id: String,
    pub professional_id: String,
    pub department: String,
    pub role: String,
    pub supervisor_id: Option<String>,
    pub manager_id: Option<String>,
    pub line_user_id: Option<String>,
    /// Absent means a random secret is hashed in its place
    pub password: Option<String>,
}

impl ProvisionUserRequest {
    /// Same field rules as self-registration
    pub fn validate(&self) -> Result<(), String> {
        common::account::validate_profile(
            &self.id,
            &self.name,
            &self.national_id,
            &self.professional_id,
            &self.department,
        )?;

        if let Some(line_user_id) = &self.line_user_id {
            common::account::validate_line_user_id(line_user_id)?;
        }

        if let Some(password) = &self.password {
            common::account::validate_password(password)?;
        }

        Ok(())
    }
}
