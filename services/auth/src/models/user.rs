//! User model and account payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role given to self-registered accounts
pub const DEFAULT_ROLE: &str = "Employee";

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
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
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated account ready to be stored
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub national_id: String,
    pub professional_id: String,
    pub department: String,
    pub role: String,
    pub line_user_id: Option<String>,
}

impl From<&RegisterRequest> for NewUser {
    fn from(req: &RegisterRequest) -> Self {
        Self {
            id: req.id.clone(),
            name: req.name.clone(),
            national_id: req.national_id.clone(),
            professional_id: req.professional_id.clone(),
            department: req.department.clone(),
            role: req
                .role
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_ROLE)
                .to_string(),
            line_user_id: None,
        }
    }
}

impl From<&LineRegisterRequest> for NewUser {
    fn from(req: &LineRegisterRequest) -> Self {
        Self {
            id: req.id.clone(),
            name: req.name.clone(),
            national_id: req.national_id.clone(),
            professional_id: req.professional_id.clone(),
            department: req.department.clone(),
            role: DEFAULT_ROLE.to_string(),
            line_user_id: Some(req.line_user_id.clone()),
        }
    }
}

/// Employee self-registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub name: String,
    pub national_id: String,
    pub professional_id: String,
    pub department: String,
    pub password: String,
    pub role: Option<String>,
}

/// Registration through a LINE identity; no password is chosen
#[derive(Debug, Clone, Deserialize)]
pub struct LineRegisterRequest {
    pub id: String,
    pub name: String,
    pub national_id: String,
    pub professional_id: String,
    pub department: String,
    pub line_user_id: String,
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub user_id: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::account::avatar_for;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: "EMP001".to_string(),
            name: "Somchai".to_string(),
            national_id: "1103700012345".to_string(),
            professional_id: "P-001".to_string(),
            department: "IT".to_string(),
            avatar: avatar_for("EMP001"),
            role: DEFAULT_ROLE.to_string(),
            supervisor_id: None,
            manager_id: None,
            line_user_id: None,
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["avatar"], "https://picsum.photos/seed/EMP001/200");
    }

    #[test]
    fn registration_defaults_to_employee_role() {
        let req = RegisterRequest {
            id: "EMP002".to_string(),
            name: "Malee".to_string(),
            national_id: "1103700012346".to_string(),
            professional_id: "P-002".to_string(),
            department: "Finance".to_string(),
            password: "letters123".to_string(),
            role: Some("  ".to_string()),
        };
        assert_eq!(NewUser::from(&req).role, DEFAULT_ROLE);

        let req = RegisterRequest {
            role: Some("Supervisor".to_string()),
            ..req
        };
        assert_eq!(NewUser::from(&req).role, "Supervisor");
    }
}
