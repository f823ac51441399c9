//! Role repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgPool, Row};

use crate::models::{RoleType, UpdateRole};

#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All roles by ascending level
    pub async fn list(&self) -> DatabaseResult<Vec<RoleType>> {
        let rows = sqlx::query("SELECT name, level FROM roles ORDER BY level ASC, name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<RoleType> {
                Ok(RoleType {
                    name: row.try_get("name")?,
                    level: row.try_get("level")?,
                })
            })
            .collect()
    }

    pub async fn exists(&self, name: &str) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(found)
    }

    /// Fails with a unique violation when the name is taken
    pub async fn create(&self, role: &RoleType) -> DatabaseResult<RoleType> {
        sqlx::query("INSERT INTO roles (name, level) VALUES ($1, $2)")
            .bind(&role.name)
            .bind(role.level)
            .execute(&self.pool)
            .await?;

        Ok(role.clone())
    }

    /// Renames cascade to users through the foreign key
    pub async fn update(&self, name: &str, update: &UpdateRole) -> DatabaseResult<Option<RoleType>> {
        let row = sqlx::query(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name), level = COALESCE($3, level), updated_at = NOW()
            WHERE name = $1
            RETURNING name, level
            "#,
        )
        .bind(name)
        .bind(&update.name)
        .bind(update.level)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(RoleType {
                name: row.try_get("name")?,
                level: row.try_get("level")?,
            })),
            None => Ok(None),
        }
    }

    /// Fails with a foreign key violation while users still hold the role
    pub async fn delete(&self, name: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
