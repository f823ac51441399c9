//! Persistence seams and their PostgreSQL implementations
//!
//! The domain services are generic over these traits so they can run against
//! Postgres in the service and against in-memory stores in tests. Every
//! mutation that guards an invariant is a single conditional statement, so
//! the database decides races.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::authority::Authority;
use crate::geo::Location;
use crate::models::{LeaveRequest, LeaveStatus, NewLeaveRequest, SystemSettings, TimeLog, User};

pub mod leave;
pub mod role;
pub mod settings;
pub mod time_log;
pub mod user;

pub use leave::LeaveRepository;
pub use role::RoleRepository;
pub use settings::SettingsRepository;
pub use time_log::TimeLogRepository;
pub use user::UserRepository;

/// Storage for attendance days, unique per (user, date)
#[async_trait]
pub trait TimeLogStore: Send + Sync {
    async fn find_by_user_and_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> DatabaseResult<Option<TimeLog>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<TimeLog>>;

    /// Record the day's check-in atomically. Returns `None` when the day
    /// already carries a check-in.
    async fn insert_check_in(
        &self,
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        location: Option<Location>,
    ) -> DatabaseResult<Option<TimeLog>>;

    /// Set the check-out only on a day that is checked in and not yet
    /// checked out. Returns `None` when no such day exists.
    async fn set_check_out(
        &self,
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        location: Option<Location>,
    ) -> DatabaseResult<Option<TimeLog>>;

    /// Newest days first
    async fn list_for_user(&self, user_id: &str, limit: i64) -> DatabaseResult<Vec<TimeLog>>;

    async fn list_for_date(&self, date: NaiveDate) -> DatabaseResult<Vec<TimeLog>>;

    /// Newest days first
    async fn list_all(&self) -> DatabaseResult<Vec<TimeLog>>;

    /// Overwrite the given timestamps; `None` keeps the stored value
    async fn update_times(
        &self,
        id: Uuid,
        check_in: Option<DateTime<Utc>>,
        check_out: Option<DateTime<Utc>>,
    ) -> DatabaseResult<Option<TimeLog>>;
}

/// Storage for leave requests
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, request: &NewLeaveRequest) -> DatabaseResult<LeaveRequest>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<LeaveRequest>>;

    /// Ordered by `requested_at`, newest first
    async fn list_by_user(&self, user_id: &str) -> DatabaseResult<Vec<LeaveRequest>>;

    /// Pending requests owned by users in scope, newest first
    async fn list_pending(&self, scope: &Authority) -> DatabaseResult<Vec<LeaveRequest>>;

    /// Every request owned by users in scope
    async fn list_in_scope(&self, scope: &Authority) -> DatabaseResult<Vec<LeaveRequest>>;

    /// Compare-and-swap on status. Returns `None` when the stored status is
    /// no longer `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: LeaveStatus,
        to: LeaveStatus,
        decided_by: &str,
        decided_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<LeaveRequest>>;
}

/// Read access to users and their reporting links
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>>;

    /// Users whose supervisor or manager is `actor_id`
    async fn list_direct_reports(&self, actor_id: &str) -> DatabaseResult<Vec<User>>;

    async fn list_all(&self) -> DatabaseResult<Vec<User>>;
}

/// The singleton settings document
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> DatabaseResult<SystemSettings>;

    async fn put(&self, settings: &SystemSettings) -> DatabaseResult<SystemSettings>;
}

/// Turn a stored enum name back into its variant
pub(crate) fn parse_column<T>(value: &str) -> DatabaseResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| common::error::DatabaseError::Decode(e.to_string()))
}

/// Pair two nullable columns into an optional coordinate
pub(crate) fn location_columns(latitude: Option<f64>, longitude: Option<f64>) -> Option<Location> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Location::new(latitude, longitude)),
        _ => None,
    }
}
