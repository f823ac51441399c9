//! Session management using Redis
//!
//! One live session per user: the id of the refresh token most recently
//! issued. Logging in elsewhere replaces it.

use anyhow::Result;
use common::{cache::RedisPool, claims::Claims};
use tracing::info;

/// Session manager for handling user sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

fn session_key(user_id: &str) -> String {
    format!("session:{}", user_id)
}

impl SessionManager {
    /// Create a new session manager; sessions live as long as a refresh token
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    /// Record `refresh` as the user's live session
    pub async fn store(&self, refresh: &Claims) -> Result<()> {
        info!(user_id = %refresh.sub, "Storing session");

        self.redis_pool
            .set(&session_key(&refresh.sub), &refresh.jti, Some(self.ttl_seconds))
            .await
    }

    /// Whether `refresh` is the user's live session
    pub async fn is_current(&self, refresh: &Claims) -> Result<bool> {
        let stored = self.redis_pool.get(&session_key(&refresh.sub)).await?;
        Ok(stored.as_deref() == Some(refresh.jti.as_str()))
    }

    /// Delete a session for a user
    pub async fn delete(&self, user_id: &str) -> Result<()> {
        info!(user_id = %user_id, "Deleting session");
        self.redis_pool.delete(&session_key(user_id)).await
    }

    /// Get Redis health status
    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}
