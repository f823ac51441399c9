//! User repository for database operations
//!
//! The HR service reads users for authority decisions and lets the admin
//! provision accounts and reassign roles and reporting lines. Self-service
//! registration goes through the auth service.

use async_trait::async_trait;
use common::{account::avatar_for, error::DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::UserDirectory;
use crate::models::{ProvisionUserRequest, UpdateUserRequest, User};

const COLUMNS: &str = "id, name, national_id, professional_id, department, avatar, role, \
     supervisor_id, manager_id, line_user_id, created_at, updated_at";

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an admin-provisioned account; `password_hash` must already be hashed
    pub async fn create(
        &self,
        request: &ProvisionUserRequest,
        password_hash: &str,
    ) -> DatabaseResult<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, name, national_id, professional_id, department, avatar,
                               role, supervisor_id, manager_id, line_user_id, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&request.id)
        .bind(request.name.trim())
        .bind(&request.national_id)
        .bind(request.professional_id.trim())
        .bind(request.department.trim())
        .bind(avatar_for(&request.id))
        .bind(&request.role)
        .bind(&request.supervisor_id)
        .bind(&request.manager_id)
        .bind(&request.line_user_id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        map_row(&row)
    }

    /// Replace a user's role and reporting links
    pub async fn update_assignment(
        &self,
        id: &str,
        update: &UpdateUserRequest,
    ) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET role = $2, supervisor_id = $3, manager_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(&update.role)
        .bind(&update.supervisor_id)
        .bind(&update.manager_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }
}

fn map_row(row: &PgRow) -> DatabaseResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        national_id: row.try_get("national_id")?,
        professional_id: row.try_get("professional_id")?,
        department: row.try_get("department")?,
        avatar: row.try_get("avatar")?,
        role: row.try_get("role")?,
        supervisor_id: row.try_get("supervisor_id")?,
        manager_id: row.try_get("manager_id")?,
        line_user_id: row.try_get("line_user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row).transpose()
    }

    async fn list_direct_reports(&self, actor_id: &str) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE supervisor_id = $1 OR manager_id = $1 ORDER BY id",
            COLUMNS
        ))
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row).collect()
    }

    async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY id", COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{live_pool, purge_users, seed_employee};
    use uuid::Uuid;

    fn provision(id: &str, national_id: &str, supervisor_id: Option<String>) -> ProvisionUserRequest {
        ProvisionUserRequest {
            id: id.to_string(),
            name: " Somchai Jaidee ".to_string(),
            national_id: national_id.to_string(),
            professional_id: "P-1001".to_string(),
            department: "Nursing".to_string(),
            role: "Employee".to_string(),
            supervisor_id,
            manager_id: None,
            line_user_id: None,
            password: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn provisioning_inserts_and_rejects_duplicates() {
        let pool = live_pool().await;
        let supervisor = seed_employee(&pool, None).await;
        let repo = UserRepository::new(pool.clone());

        let id = format!("IT-{}", Uuid::new_v4().simple());
        let national_id = Uuid::new_v4().simple().to_string();
        let user = repo
            .create(&provision(&id, &national_id, Some(supervisor.clone())), "hash")
            .await
            .unwrap();
        assert_eq!(user.name, "Somchai Jaidee");
        assert_eq!(user.supervisor_id.as_deref(), Some(supervisor.as_str()));
        assert_eq!(user.avatar, avatar_for(&id));

        let other_id = format!("IT-{}", Uuid::new_v4().simple());
        let duplicate = repo
            .create(&provision(&other_id, &national_id, None), "hash")
            .await
            .unwrap_err();
        assert!(duplicate.is_unique_violation());

        let orphan = repo
            .create(
                &provision(&other_id, &Uuid::new_v4().simple().to_string(), Some("IT-missing".to_string())),
                "hash",
            )
            .await
            .unwrap_err();
        assert!(orphan.is_foreign_key_violation());

        purge_users(&pool, &[id, supervisor]).await;
    }
}
