//! Attendance ledger: one time log per user per office day
//!
//! A day moves from no log, to checked in, to checked out, and stops there.
//! Both transitions are single conditional writes in the store, so two racing
//! punches for the same day cannot both succeed.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseError;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::geo::Location;
use crate::models::TimeLog;
use crate::repositories::TimeLogStore;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("already checked in today")]
    AlreadyCheckedIn,

    #[error("not checked in today")]
    NotCheckedIn,

    #[error("already checked out today")]
    AlreadyCheckedOut,

    #[error("time log not found")]
    NotFound,

    #[error("invalid amendment: {0}")]
    InvalidAmendment(&'static str),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Clone)]
pub struct AttendanceLedger<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: TimeLogStore> AttendanceLedger<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn get_today_log(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> LedgerResult<Option<TimeLog>> {
        Ok(self.store.find_by_user_and_date(user_id, today).await?)
    }

    pub async fn record_check_in(
        &self,
        user_id: &str,
        today: NaiveDate,
        location: Option<Location>,
    ) -> LedgerResult<TimeLog> {
        let now = self.clock.now();

        match self
            .store
            .insert_check_in(user_id, today, now, location)
            .await
        {
            Ok(Some(log)) => {
                info!(user_id, date = %today, "checked in");
                Ok(log)
            }
            Ok(None) => Err(LedgerError::AlreadyCheckedIn),
            // A store without an upsert surfaces the race as a key violation
            Err(e) if e.is_unique_violation() => {
                debug!(user_id, date = %today, "check-in lost a race on the day key");
                Err(LedgerError::AlreadyCheckedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn record_check_out(
        &self,
        user_id: &str,
        today: NaiveDate,
        location: Option<Location>,
    ) -> LedgerResult<TimeLog> {
        let now = self.clock.now();

        if let Some(log) = self
            .store
            .set_check_out(user_id, today, now, location)
            .await?
        {
            info!(user_id, date = %today, "checked out");
            return Ok(log);
        }

        // The conditional write matched nothing; work out which guard failed
        match self.store.find_by_user_and_date(user_id, today).await? {
            Some(log) if log.is_checked_out() => Err(LedgerError::AlreadyCheckedOut),
            _ => Err(LedgerError::NotCheckedIn),
        }
    }

    /// Most recent days first
    pub async fn history(&self, user_id: &str, limit: i64) -> LedgerResult<Vec<TimeLog>> {
        Ok(self.store.list_for_user(user_id, limit.max(0)).await?)
    }

    pub async fn list_all(&self) -> LedgerResult<Vec<TimeLog>> {
        Ok(self.store.list_all().await?)
    }

    /// Admin correction of a day's timestamps; `None` keeps the stored value
    pub async fn amend(
        &self,
        id: Uuid,
        check_in: Option<DateTime<Utc>>,
        check_out: Option<DateTime<Utc>>,
    ) -> LedgerResult<TimeLog> {
        let stored = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::NotFound)?;

        match (check_in.or(stored.check_in), check_out.or(stored.check_out)) {
            (None, Some(_)) => {
                return Err(LedgerError::InvalidAmendment(
                    "check-out requires a check-in",
                ));
            }
            (Some(start), Some(end)) if end < start => {
                return Err(LedgerError::InvalidAmendment(
                    "check-out is before check-in",
                ));
            }
            _ => {}
        }

        if check_in.is_none() && check_out.is_none() {
            return Ok(stored);
        }

        // The store keeps columns passed as None, so a concurrent check-out
        // is never overwritten with a stale read
        let log = self
            .store
            .update_times(id, check_in, check_out)
            .await?
            .ok_or(LedgerError::NotFound)?;

        info!(log_id = %id, user_id = %log.user_id, "time log amended");
        Ok(log)
    }
}
