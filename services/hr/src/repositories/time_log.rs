//! Time log repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{TimeLogStore, location_columns};
use crate::geo::Location;
use crate::models::TimeLog;

const COLUMNS: &str = "id, user_id, log_date, check_in, check_out, \
     check_in_latitude, check_in_longitude, check_out_latitude, check_out_longitude";

/// Time log repository backed by the `time_logs` table
#[derive(Clone)]
pub struct TimeLogRepository {
    pool: PgPool,
}

impl TimeLogRepository {
    /// Create a new time log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(row: &PgRow) -> DatabaseResult<TimeLog> {
    Ok(TimeLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        date: row.try_get("log_date")?,
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        check_in_location: location_columns(
            row.try_get("check_in_latitude")?,
            row.try_get("check_in_longitude")?,
        ),
        check_out_location: location_columns(
            row.try_get("check_out_latitude")?,
            row.try_get("check_out_longitude")?,
        ),
    })
}

fn map_rows(rows: Vec<PgRow>) -> DatabaseResult<Vec<TimeLog>> {
    rows.iter().map(map_row).collect()
}

#[async_trait]
impl TimeLogStore for TimeLogRepository {
    async fn find_by_user_and_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> DatabaseResult<Option<TimeLog>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM time_logs WHERE user_id = $1 AND log_date = $2",
            COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<TimeLog>> {
        let row = sqlx::query(&format!("SELECT {} FROM time_logs WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row).transpose()
    }

    async fn insert_check_in(
        &self,
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        location: Option<Location>,
    ) -> DatabaseResult<Option<TimeLog>> {
        // The (user_id, log_date) key serializes concurrent check-ins; the
        // loser matches the existing row, fails the WHERE and returns nothing.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO time_logs (id, user_id, log_date, check_in, check_in_latitude, check_in_longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, log_date) DO UPDATE SET
                check_in = EXCLUDED.check_in,
                check_in_latitude = EXCLUDED.check_in_latitude,
                check_in_longitude = EXCLUDED.check_in_longitude
            WHERE time_logs.check_in IS NULL
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(date)
        .bind(at)
        .bind(location.map(|l| l.latitude))
        .bind(location.map(|l| l.longitude))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }

    async fn set_check_out(
        &self,
        user_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
        location: Option<Location>,
    ) -> DatabaseResult<Option<TimeLog>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE time_logs
            SET check_out = $3, check_out_latitude = $4, check_out_longitude = $5
            WHERE user_id = $1 AND log_date = $2
              AND check_in IS NOT NULL AND check_out IS NULL
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(user_id)
        .bind(date)
        .bind(at)
        .bind(location.map(|l| l.latitude))
        .bind(location.map(|l| l.longitude))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }

    async fn list_for_user(&self, user_id: &str, limit: i64) -> DatabaseResult<Vec<TimeLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM time_logs WHERE user_id = $1 ORDER BY log_date DESC LIMIT $2",
            COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        map_rows(rows)
    }

    async fn list_for_date(&self, date: NaiveDate) -> DatabaseResult<Vec<TimeLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM time_logs WHERE log_date = $1 ORDER BY check_in ASC NULLS LAST",
            COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        map_rows(rows)
    }

    async fn list_all(&self) -> DatabaseResult<Vec<TimeLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM time_logs ORDER BY log_date DESC, user_id ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        map_rows(rows)
    }

    async fn update_times(
        &self,
        id: Uuid,
        check_in: Option<DateTime<Utc>>,
        check_out: Option<DateTime<Utc>>,
    ) -> DatabaseResult<Option<TimeLog>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE time_logs
            SET check_in = COALESCE($2, check_in), check_out = COALESCE($3, check_out)
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(check_in)
        .bind(check_out)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }
}
