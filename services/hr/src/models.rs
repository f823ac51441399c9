//! HR models for persisted records and request/response payloads

use serde::Deserialize;
use thiserror::Error;

pub mod leave;
pub mod role;
pub mod settings;
pub mod time_log;
pub mod user;

pub use leave::{
    CreateLeaveRequest, DecideLeaveRequest, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
pub use role::{RoleType, UpdateRole};
pub use settings::{SettingsError, SystemSettings};
pub use time_log::{AmendTimeLogRequest, PunchRequest, PunchResponse, TimeLog};
pub use user::{AuthUser, ProvisionUserRequest, UpdateUserRequest, User};

/// A stored or submitted string that names no known variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Query parameters for listings; without `page` or `limit` the full list is returned
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.page.is_none() && self.limit.is_none() {
            return items;
        }

        let page = self.page.unwrap_or(1).max(1) as usize;
        let limit = self.limit.unwrap_or(10).clamp(1, 100) as usize;

        items
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect()
    }
}
