//! Office geofence settings

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{InvalidCoordinate, Location};

/// System-wide settings; exactly one instance is stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub office_location: Location,
    pub check_in_radius_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SettingsError {
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    #[error("check-in radius must be a positive number of meters, got {0}")]
    InvalidRadius(f64),
}

impl SystemSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.office_location.validate()?;

        if !self.check_in_radius_meters.is_finite() || self.check_in_radius_meters <= 0.0 {
            return Err(SettingsError::InvalidRadius(self.check_in_radius_meters));
        }

        Ok(())
    }
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            office_location: Location::new(13.7563, 100.5018),
            check_in_radius_meters: 200.0,
        }
    }
}
