//! Geofence admission control for check-in and check-out
//!
//! A punch is admitted when the device coordinate lies within the configured
//! radius of the office. The settings snapshot is passed in by the caller for
//! every evaluation, so the controller holds no state of its own.

use thiserror::Error;

use crate::geo::{InvalidCoordinate, Location, distance_meters};
use crate::models::SystemSettings;

/// Outcome of an admission check; a rejection is a normal result, not an error
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Admitted {
        distance_meters: f64,
    },
    Rejected {
        distance_meters: f64,
        radius_meters: f64,
    },
}

#[cfg(test)]
impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }

    pub fn distance_meters(&self) -> f64 {
        match self {
            Admission::Admitted { distance_meters } => *distance_meters,
            Admission::Rejected {
                distance_meters, ..
            } => *distance_meters,
        }
    }

    /// Distance rounded to whole meters for user-facing messages
    pub fn display_distance(&self) -> u64 {
        display_meters(self.distance_meters())
    }
}

/// Why a coordinate could not be evaluated at all
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeofenceError {
    /// The device did not produce a coordinate (permission, timeout, no signal)
    #[error("device location is unavailable")]
    LocationUnavailable,

    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),
}

/// Admit iff the unrounded distance is within `radius_meters`
pub fn admit(user: &Location, office: &Location, radius_meters: f64) -> Admission {
    let distance_meters = distance_meters(user, office);

    if distance_meters <= radius_meters {
        Admission::Admitted { distance_meters }
    } else {
        Admission::Rejected {
            distance_meters,
            radius_meters,
        }
    }
}

/// Evaluate an optional device coordinate against a settings snapshot
pub fn evaluate(
    user: Option<Location>,
    settings: &SystemSettings,
) -> Result<Admission, GeofenceError> {
    let user = user.ok_or(GeofenceError::LocationUnavailable)?;
    user.validate()?;

    Ok(admit(
        &user,
        &settings.office_location,
        settings.check_in_radius_meters,
    ))
}

pub fn display_meters(meters: f64) -> u64 {
    meters.round().max(0.0) as u64
}
