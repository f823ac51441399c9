//! Check-in and check-out: settings snapshot, then admission, then the ledger

use chrono::NaiveDate;
use common::error::DatabaseError;
use thiserror::Error;
use tracing::{info, warn};

use crate::geo::{InvalidCoordinate, Location};
use crate::geofence::{self, Admission, GeofenceError, display_meters};
use crate::ledger::{AttendanceLedger, LedgerError};
use crate::models::{PunchResponse, TimeLog};
use crate::repositories::{SettingsStore, TimeLogStore};

#[derive(Debug, Error)]
pub enum PunchError {
    #[error("device location is unavailable")]
    LocationUnavailable,

    #[error(transparent)]
    InvalidCoordinate(InvalidCoordinate),

    #[error("outside the check-in area: {distance_meters} m from the office, limit {radius_meters} m")]
    OutsideGeofence {
        distance_meters: u64,
        radius_meters: u64,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<GeofenceError> for PunchError {
    fn from(err: GeofenceError) -> Self {
        match err {
            GeofenceError::LocationUnavailable => PunchError::LocationUnavailable,
            GeofenceError::InvalidCoordinate(c) => PunchError::InvalidCoordinate(c),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Punch {
    In,
    Out,
}

impl Punch {
    fn as_str(&self) -> &'static str {
        match self {
            Punch::In => "check-in",
            Punch::Out => "check-out",
        }
    }
}

#[derive(Clone)]
pub struct TimeClock<T, S> {
    ledger: AttendanceLedger<T>,
    settings: S,
}

impl<T: TimeLogStore, S: SettingsStore> TimeClock<T, S> {
    pub fn new(ledger: AttendanceLedger<T>, settings: S) -> Self {
        Self { ledger, settings }
    }

    pub fn ledger(&self) -> &AttendanceLedger<T> {
        &self.ledger
    }

    pub async fn check_in(
        &self,
        user_id: &str,
        today: NaiveDate,
        location: Option<Location>,
    ) -> Result<PunchResponse, PunchError> {
        self.punch(Punch::In, user_id, today, location).await
    }

    pub async fn check_out(
        &self,
        user_id: &str,
        today: NaiveDate,
        location: Option<Location>,
    ) -> Result<PunchResponse, PunchError> {
        self.punch(Punch::Out, user_id, today, location).await
    }

    async fn punch(
        &self,
        kind: Punch,
        user_id: &str,
        today: NaiveDate,
        location: Option<Location>,
    ) -> Result<PunchResponse, PunchError> {
        let settings = self.settings.get().await?;

        let distance_meters = match geofence::evaluate(location, &settings)? {
            Admission::Admitted { distance_meters } => distance_meters,
            Admission::Rejected {
                distance_meters,
                radius_meters,
            } => {
                warn!(
                    user_id,
                    punch = kind.as_str(),
                    distance_meters,
                    radius_meters,
                    "punch rejected outside geofence"
                );
                return Err(PunchError::OutsideGeofence {
                    distance_meters: display_meters(distance_meters),
                    radius_meters: display_meters(radius_meters),
                });
            }
        };

        let time_log: TimeLog = match kind {
            Punch::In => self.ledger.record_check_in(user_id, today, location).await?,
            Punch::Out => self.ledger.record_check_out(user_id, today, location).await?,
        };

        info!(
            user_id,
            punch = kind.as_str(),
            distance_meters = display_meters(distance_meters),
            "punch admitted"
        );

        Ok(PunchResponse {
            time_log,
            distance_meters: display_meters(distance_meters),
        })
    }
}
