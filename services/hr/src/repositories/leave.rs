//! Leave request repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{LeaveStore, parse_column};
use crate::authority::Authority;
use crate::models::{LeaveRequest, LeaveStatus, NewLeaveRequest};

const COLUMNS: &str = "id, user_id, leave_type, start_date, end_date, reason, status, \
     requested_at, decided_by, decided_at";

/// Leave request repository backed by the `leave_requests` table
#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

impl LeaveRepository {
    /// Create a new leave request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Owner filter for a scope; `None` means unrestricted
    fn owner_filter(scope: &Authority) -> Option<Vec<String>> {
        match scope {
            Authority::Everyone => None,
            Authority::DirectReports(ids) => Some(ids.iter().cloned().collect()),
        }
    }
}

fn map_row(row: &PgRow) -> DatabaseResult<LeaveRequest> {
    let leave_type: String = row.try_get("leave_type")?;
    let status: String = row.try_get("status")?;

    Ok(LeaveRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        leave_type: parse_column(&leave_type)?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        reason: row.try_get("reason")?,
        status: parse_column(&status)?,
        requested_at: row.try_get("requested_at")?,
        decided_by: row.try_get("decided_by")?,
        decided_at: row.try_get("decided_at")?,
    })
}

fn map_rows(rows: Vec<PgRow>) -> DatabaseResult<Vec<LeaveRequest>> {
    rows.iter().map(map_row).collect()
}

#[async_trait]
impl LeaveStore for LeaveRepository {
    async fn insert(&self, request: &NewLeaveRequest) -> DatabaseResult<LeaveRequest> {
        // Status is never taken from the caller
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO leave_requests (id, user_id, leave_type, start_date, end_date, reason, status, requested_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'Pending', $7)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(request.id)
        .bind(&request.user_id)
        .bind(request.leave_type.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.requested_at)
        .fetch_one(&self.pool)
        .await?;

        map_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<LeaveRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM leave_requests WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }

    async fn list_by_user(&self, user_id: &str) -> DatabaseResult<Vec<LeaveRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM leave_requests WHERE user_id = $1 ORDER BY requested_at DESC",
            COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        map_rows(rows)
    }

    async fn list_pending(&self, scope: &Authority) -> DatabaseResult<Vec<LeaveRequest>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM leave_requests
            WHERE status = 'Pending' AND ($1::TEXT[] IS NULL OR user_id = ANY($1))
            ORDER BY requested_at DESC
            "#,
            COLUMNS
        ))
        .bind(Self::owner_filter(scope))
        .fetch_all(&self.pool)
        .await?;

        map_rows(rows)
    }

    async fn list_in_scope(&self, scope: &Authority) -> DatabaseResult<Vec<LeaveRequest>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM leave_requests
            WHERE $1::TEXT[] IS NULL OR user_id = ANY($1)
            ORDER BY requested_at DESC
            "#,
            COLUMNS
        ))
        .bind(Self::owner_filter(scope))
        .fetch_all(&self.pool)
        .await?;

        map_rows(rows)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: LeaveStatus,
        to: LeaveStatus,
        decided_by: &str,
        decided_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<LeaveRequest>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE leave_requests
            SET status = $3, decided_by = $4, decided_at = $5
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(decided_by)
        .bind(decided_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeaveType;
    use crate::testing::{date, live_pool, purge_users, seed_employee};

    async fn submit(repo: &LeaveRepository, user_id: &str) -> LeaveRequest {
        repo.insert(&NewLeaveRequest {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            leave_type: LeaveType::Sick,
            start_date: date(2024, 8, 5),
            end_date: date(2024, 8, 6),
            reason: "fever".to_string(),
            requested_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn pending_filter_follows_the_scope() {
        let pool = live_pool().await;
        let supervisor = seed_employee(&pool, None).await;
        let report = seed_employee(&pool, Some(&supervisor)).await;
        let outsider = seed_employee(&pool, None).await;
        let repo = LeaveRepository::new(pool.clone());

        let reported = submit(&repo, &report).await;
        let foreign = submit(&repo, &outsider).await;
        assert_eq!(reported.status, LeaveStatus::Pending);

        let direct = Authority::DirectReports([report.clone()].into_iter().collect());
        let scoped = repo.list_pending(&direct).await.unwrap();
        assert_eq!(scoped, vec![reported.clone()]);

        let everyone: Vec<Uuid> = repo
            .list_pending(&Authority::Everyone)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert!(everyone.contains(&reported.id));
        assert!(everyone.contains(&foreign.id));

        let nobody = Authority::DirectReports(Default::default());
        assert!(repo.list_pending(&nobody).await.unwrap().is_empty());
        assert!(repo.list_in_scope(&nobody).await.unwrap().is_empty());

        purge_users(&pool, &[report, outsider, supervisor]).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn concurrent_decisions_settle_once() {
        let pool = live_pool().await;
        let supervisor = seed_employee(&pool, None).await;
        let report = seed_employee(&pool, Some(&supervisor)).await;
        let repo = LeaveRepository::new(pool.clone());
        let request = submit(&repo, &report).await;

        let tasks: Vec<_> = [LeaveStatus::Approved, LeaveStatus::Rejected]
            .into_iter()
            .map(|to| {
                let repo = repo.clone();
                let supervisor = supervisor.clone();
                tokio::spawn(async move {
                    repo.transition(request.id, LeaveStatus::Pending, to, &supervisor, Utc::now())
                        .await
                })
            })
            .collect();
        let mut decided = Vec::new();
        for task in tasks {
            decided.extend(task.await.unwrap().unwrap());
        }

        assert_eq!(decided.len(), 1);
        let stored = repo.find_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, decided[0].status);
        assert_eq!(stored.decided_by.as_deref(), Some(supervisor.as_str()));

        let direct = Authority::DirectReports([report.clone()].into_iter().collect());
        assert!(repo.list_pending(&direct).await.unwrap().is_empty());
        assert_eq!(repo.list_in_scope(&direct).await.unwrap().len(), 1);

        purge_users(&pool, &[report, supervisor]).await;
    }
}
