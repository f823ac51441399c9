//! User repository for database operations

use common::{account::avatar_for, error::DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::models::{NewUser, User};

const COLUMNS: &str = "id, name, national_id, professional_id, department, avatar, role, \
     supervisor_id, manager_id, line_user_id, password_hash, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account; `password_hash` must already be hashed
    pub async fn create(&self, new_user: &NewUser, password_hash: &str) -> DatabaseResult<User> {
        info!(user_id = %new_user.id, role = %new_user.role, "Creating new user");

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, name, national_id, professional_id, department, avatar,
                               role, line_user_id, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&new_user.id)
        .bind(new_user.name.trim())
        .bind(&new_user.national_id)
        .bind(new_user.professional_id.trim())
        .bind(new_user.department.trim())
        .bind(avatar_for(&new_user.id))
        .bind(&new_user.role)
        .bind(&new_user.line_user_id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        map_row(&row)
    }

    /// Find a user by employee id
    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row).transpose()
    }

    /// Find the account linked to a LINE identity
    pub async fn find_by_line_user_id(&self, line_user_id: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE line_user_id = $1",
            COLUMNS
        ))
        .bind(line_user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row).transpose()
    }

    /// Whether an account already uses this employee id or national id
    pub async fn exists(&self, id: &str, national_id: &str) -> DatabaseResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 OR national_id = $2) AS taken",
        )
        .bind(id)
        .bind(national_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("taken")?)
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
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
