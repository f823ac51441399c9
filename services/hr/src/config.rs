//! HR service configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `config/hr.toml`, then `HR__SECTION__KEY` environment variables.
//! Infrastructure (database, JWT key) keeps its own `from_env` loaders.

use chrono::{FixedOffset, NaiveTime};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::clock::OfficeCalendar;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub authority: AuthorityConfig,
    pub attendance: AttendanceConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityConfig {
    /// Role name that decides for every user
    pub admin_role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceConfig {
    /// Office offset from UTC, in minutes
    pub utc_offset_minutes: i32,
    /// Check-ins strictly after this local time (`HH:MM`) are late
    pub late_after: String,
    /// Days returned by the own-history listing
    pub history_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// The assistant is disabled without a key
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .set_default("server.bind", "0.0.0.0:3001")?
            .set_default("authority.admin_role", "Administrator")?
            .set_default("attendance.utc_offset_minutes", 420)?
            .set_default("attendance.late_after", "09:00")?
            .set_default("attendance.history_limit", 31)?
            .set_default("assistant.model", "gemini-2.5-flash")?
            .set_default(
                "assistant.endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("assistant.timeout_secs", 30)?
            .add_source(File::with_name("config/hr").required(false))
            .add_source(Environment::with_prefix("HR").separator("__"))
            .build()?
            .try_deserialize()?;

        config.calendar()?;
        Ok(config)
    }

    /// Office time zone and lateness cutoff
    pub fn calendar(&self) -> Result<OfficeCalendar, ConfigError> {
        let offset = FixedOffset::east_opt(self.attendance.utc_offset_minutes * 60).ok_or_else(
            || {
                ConfigError::Message(format!(
                    "attendance.utc_offset_minutes out of range: {}",
                    self.attendance.utc_offset_minutes
                ))
            },
        )?;

        let late_after = NaiveTime::parse_from_str(&self.attendance.late_after, "%H:%M")
            .map_err(|e| {
                ConfigError::Message(format!(
                    "attendance.late_after must be HH:MM, got {:?}: {}",
                    self.attendance.late_after, e
                ))
            })?;

        Ok(OfficeCalendar::new(offset, late_after))
    }
}
