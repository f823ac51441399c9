//! Settings repository for the singleton `system_settings` row

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row};
use tracing::warn;

use super::SettingsStore;
use crate::geo::Location;
use crate::models::SystemSettings;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get(&self) -> DatabaseResult<SystemSettings> {
        let row = sqlx::query(
            r#"
            SELECT office_latitude, office_longitude, check_in_radius_meters
            FROM system_settings
            WHERE singleton
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(SystemSettings {
                office_location: Location::new(
                    row.try_get("office_latitude")?,
                    row.try_get("office_longitude")?,
                ),
                check_in_radius_meters: row.try_get("check_in_radius_meters")?,
            }),
            None => {
                warn!("system_settings row missing, falling back to defaults");
                Ok(SystemSettings::default())
            }
        }
    }

    async fn put(&self, settings: &SystemSettings) -> DatabaseResult<SystemSettings> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (singleton, office_latitude, office_longitude, check_in_radius_meters)
            VALUES (TRUE, $1, $2, $3)
            ON CONFLICT (singleton) DO UPDATE SET
                office_latitude = EXCLUDED.office_latitude,
                office_longitude = EXCLUDED.office_longitude,
                check_in_radius_meters = EXCLUDED.check_in_radius_meters,
                updated_at = NOW()
            "#,
        )
        .bind(settings.office_location.latitude)
        .bind(settings.office_location.longitude)
        .bind(settings.check_in_radius_meters)
        .execute(&self.pool)
        .await?;

        Ok(*settings)
    }
}
