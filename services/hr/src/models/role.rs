//! Role model

use serde::{Deserialize, Serialize};

/// Role entity; `level` orders roles for display and grants nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleType {
    pub name: String,
    pub level: i32,
}

/// Role update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub level: Option<i32>,
}
