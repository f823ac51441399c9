//! In-memory stores and fixtures for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::authority::Authority;
use crate::clock::Clock;
use crate::geo::Location;
use crate::models::{
    AuthUser, LeaveRequest, LeaveStatus, NewLeaveRequest, SystemSettings, TimeLog, User,
};
use crate::repositories::{LeaveStore, SettingsStore, TimeLogStore, UserDirectory};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Pool against the database named by `DATABASE_URL`, migrated
pub async fn live_pool() -> PgPool {
    let config = DatabaseConfig::from_env().unwrap();
    let pool = init_pool(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

/// Insert an employee under a fresh id so runs never collide
pub async fn seed_employee(pool: &PgPool, supervisor_id: Option<&str>) -> String {
    let id = format!("IT-{}", Uuid::new_v4().simple());
    sqlx::query(
        r#"
        INSERT INTO users (id, name, national_id, professional_id, department, role, supervisor_id, password_hash)
        VALUES ($1, 'Integration', $2, 'P-0000', 'QA', 'Employee', $3, 'x')
        "#,
    )
    .bind(&id)
    .bind(Uuid::new_v4().simple().to_string())
    .bind(supervisor_id)
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Remove seeded users together with everything that references them
pub async fn purge_users(pool: &PgPool, ids: &[String]) {
    for table in ["leave_requests", "time_logs"] {
        sqlx::query(&format!("DELETE FROM {} WHERE user_id = ANY($1)", table))
            .bind(ids)
            .execute(pool)
            .await
            .unwrap();
    }
    sqlx::query("DELETE FROM users WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await
        .unwrap();
}

pub fn actor(id: &str, role: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        role: role.to_string(),
    }
}

pub fn user(id: &str, role: &str, supervisor: Option<&str>, manager: Option<&str>) -> User {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        national_id: format!("NID-{}", id),
        professional_id: format!("P-{}", id),
        department: "IT".to_string(),
        avatar: String::new(),
        role: role.to_string(),
        supervisor_id: supervisor.map(str::to_string),
        manager_id: manager.map(str::to_string),
        line_user_id: None,
        created_at: created,
        updated_at: created,
    }
}

/// Clock that advances one second on every reading
#[derive(Clone)]
pub struct SteppingClock {
    seconds: Arc<AtomicI64>,
}

impl SteppingClock {
    pub fn starting_at(instant: DateTime<Utc>) -> Self {
        Self {
            seconds: Arc::new(AtomicI64::new(instant.timestamp())),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.seconds.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).unwrap()
    }
}

#[derive(Clone, Default)]
pub struct MemoryTimeLogStore {
    logs: Arc<Mutex<HashMap<(String, NaiveDate), TimeLog>>>,
}

impl MemoryTimeLogStore {
    pub fn insert(&self, log: TimeLog) {
        self.logs
            .lock()
            .unwrap()
            .insert((log.user_id.clone(), log.date), log);
    }

    pub fn count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

fn newest_first(mut logs: Vec<TimeLog>) -> Vec<TimeLog> {
    logs.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.user_id.cmp(&b.user_id)));
    logs
}

#[async_trait]
impl TimeLogStore for MemoryTimeLogStore {
    async fn find_by_user_and_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> DatabaseResult<Option<TimeLog>> {
        let logs = self.logs.lock().unwrap();
        Ok(logs.get(&(user_id.to_string(), date)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<TimeLog>> {
        let logs = self.logs.lock().unwrap();
        Ok(logs.values().find(|l| l.id == id).cloned())
    }

    async fn insert_check_in(
        &self,
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        location: Option<Location>,
    ) -> DatabaseResult<Option<TimeLog>> {
        let mut logs = self.logs.lock().unwrap();
        let log = logs
            .entry((user_id.to_string(), date))
            .or_insert_with(|| TimeLog {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                date,
                check_in: None,
                check_out: None,
                check_in_location: None,
                check_out_location: None,
            });

        if log.check_in.is_some() {
            return Ok(None);
        }
        log.check_in = Some(at);
        log.check_in_location = location;
        Ok(Some(log.clone()))
    }

    async fn set_check_out(
        &self,
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        location: Option<Location>,
    ) -> DatabaseResult<Option<TimeLog>> {
        let mut logs = self.logs.lock().unwrap();
        match logs.get_mut(&(user_id.to_string(), date)) {
            Some(log) if log.check_in.is_some() && log.check_out.is_none() => {
                log.check_out = Some(at);
                log.check_out_location = location;
                Ok(Some(log.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: &str, limit: i64) -> DatabaseResult<Vec<TimeLog>> {
        let logs = self.logs.lock().unwrap();
        let mine = logs
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(mine)
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_for_date(&self, date: NaiveDate) -> DatabaseResult<Vec<TimeLog>> {
        let logs = self.logs.lock().unwrap();
        Ok(logs.values().filter(|l| l.date == date).cloned().collect())
    }

    async fn list_all(&self) -> DatabaseResult<Vec<TimeLog>> {
        let logs = self.logs.lock().unwrap();
        Ok(newest_first(logs.values().cloned().collect()))
    }

    async fn update_times(
        &self,
        id: Uuid,
        check_in: Option<DateTime<Utc>>,
        check_out: Option<DateTime<Utc>>,
    ) -> DatabaseResult<Option<TimeLog>> {
        let mut logs = self.logs.lock().unwrap();
        match logs.values_mut().find(|l| l.id == id) {
            Some(log) => {
                log.check_in = check_in.or(log.check_in);
                log.check_out = check_out.or(log.check_out);
                Ok(Some(log.clone()))
            }
            None => Ok(None),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryLeaveStore {
    requests: Arc<Mutex<Vec<LeaveRequest>>>,
}

impl MemoryLeaveStore {
    pub fn insert_existing(&self, request: LeaveRequest) {
        self.requests.lock().unwrap().push(request);
    }

    pub fn status_of(&self, id: Uuid) -> Option<LeaveStatus> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status)
    }
}

fn requested_newest_first(mut requests: Vec<LeaveRequest>) -> Vec<LeaveRequest> {
    requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    requests
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn insert(&self, request: &NewLeaveRequest) -> DatabaseResult<LeaveRequest> {
        let stored = LeaveRequest {
            id: request.id,
            user_id: request.user_id.clone(),
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason.clone(),
            status: LeaveStatus::Pending,
            requested_at: request.requested_at,
            decided_by: None,
            decided_at: None,
        };
        self.requests.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<LeaveRequest>> {
        let requests = self.requests.lock().unwrap();
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: &str) -> DatabaseResult<Vec<LeaveRequest>> {
        let requests = self.requests.lock().unwrap();
        Ok(requested_newest_first(
            requests
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_pending(&self, scope: &Authority) -> DatabaseResult<Vec<LeaveRequest>> {
        let requests = self.requests.lock().unwrap();
        Ok(requested_newest_first(
            requests
                .iter()
                .filter(|r| r.status == LeaveStatus::Pending && scope.covers(&r.user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_in_scope(&self, scope: &Authority) -> DatabaseResult<Vec<LeaveRequest>> {
        let requests = self.requests.lock().unwrap();
        Ok(requested_newest_first(
            requests
                .iter()
                .filter(|r| scope.covers(&r.user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: LeaveStatus,
        to: LeaveStatus,
        decided_by: &str,
        decided_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<LeaveRequest>> {
        let mut requests = self.requests.lock().unwrap();
        match requests.iter_mut().find(|r| r.id == id && r.status == from) {
            Some(request) => {
                request.status = to;
                request.decided_by = Some(decided_by.to_string());
                request.decided_at = Some(decided_at);
                Ok(Some(request.clone()))
            }
            None => Ok(None),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<Vec<User>>,
}

impl MemoryUserDirectory {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_direct_reports(&self, actor_id: &str) -> DatabaseResult<Vec<User>> {
        Ok(self
            .users
            .iter()
            .filter(|u| {
                u.supervisor_id.as_deref() == Some(actor_id)
                    || u.manager_id.as_deref() == Some(actor_id)
            })
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        Ok(self.users.as_ref().clone())
    }
}

#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    settings: Arc<Mutex<SystemSettings>>,
}

impl MemorySettingsStore {
    pub fn with(settings: SystemSettings) -> Self {
        Self {
            settings: Arc::new(Mutex::new(settings)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> DatabaseResult<SystemSettings> {
        Ok(*self.settings.lock().unwrap())
    }

    async fn put(&self, settings: &SystemSettings) -> DatabaseResult<SystemSettings> {
        *self.settings.lock().unwrap() = *settings;
        Ok(*settings)
    }
}
