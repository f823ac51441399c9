//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    assistant::Assistant,
    authority::AuthorityResolver,
    clock::{Clock, OfficeCalendar, SystemClock},
    config::AppConfig,
    dashboard::Dashboard,
    leave::LeaveWorkflow,
    ledger::AttendanceLedger,
    middleware::JwtVerifier,
    repositories::{
        LeaveRepository, RoleRepository, SettingsRepository, TimeLogRepository, UserRepository,
    },
    timeclock::TimeClock,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub calendar: OfficeCalendar,
    pub clock: Arc<dyn Clock>,
    pub jwt: JwtVerifier,
    pub time_clock: TimeClock<TimeLogRepository, SettingsRepository>,
    pub leave: LeaveWorkflow<LeaveRepository, UserRepository>,
    pub dashboard: Dashboard<TimeLogRepository, LeaveRepository, UserRepository>,
    pub assistant: Assistant,
    pub time_log_repository: TimeLogRepository,
    pub leave_repository: LeaveRepository,
    pub user_repository: UserRepository,
    pub role_repository: RoleRepository,
    pub settings_repository: SettingsRepository,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: AppConfig, jwt: JwtVerifier) -> anyhow::Result<Self> {
        let calendar = config.calendar()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let time_log_repository = TimeLogRepository::new(db_pool.clone());
        let leave_repository = LeaveRepository::new(db_pool.clone());
        let user_repository = UserRepository::new(db_pool.clone());
        let role_repository = RoleRepository::new(db_pool.clone());
        let settings_repository = SettingsRepository::new(db_pool.clone());

        let resolver =
            AuthorityResolver::new(user_repository.clone(), config.authority.admin_role.clone());

        let ledger = AttendanceLedger::new(time_log_repository.clone(), clock.clone());
        let time_clock = TimeClock::new(ledger, settings_repository.clone());
        let leave = LeaveWorkflow::new(leave_repository.clone(), resolver.clone(), clock.clone());
        let dashboard = Dashboard::new(
            time_log_repository.clone(),
            leave_repository.clone(),
            resolver,
            calendar,
        );
        let assistant = Assistant::new(config.assistant.clone())?;

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            calendar,
            clock,
            jwt,
            time_clock,
            leave,
            dashboard,
            assistant,
            time_log_repository,
            leave_repository,
            user_repository,
            role_repository,
            settings_repository,
        })
    }

    /// The office-local date right now
    pub fn today(&self) -> chrono::NaiveDate {
        self.calendar.date_of(self.clock.now())
    }
}
