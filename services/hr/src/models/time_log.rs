//! Attendance records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Location;

/// One attendance day for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub check_in_location: Option<Location>,
    pub check_out_location: Option<Location>,
}

impl TimeLog {
    pub fn is_checked_out(&self) -> bool {
        self.check_out.is_some()
    }
}

/// Body of a check-in or check-out call; `location` is null when the device
/// could not produce coordinates
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PunchRequest {
    pub location: Option<Location>,
}

/// A recorded punch together with the measured distance from the office
#[derive(Debug, Clone, Serialize)]
pub struct PunchResponse {
    #[serde(flatten)]
    pub time_log: TimeLog,
    /// Whole meters, display only
    pub distance_meters: u64,
}

/// Admin correction of a day's timestamps
#[derive(Debug, Clone, Deserialize)]
pub struct AmendTimeLogRequest {
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
}
