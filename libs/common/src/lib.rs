//! Common library for the TimeLink HR services
//!
//! This crate provides shared functionality used by the authentication and
//! HR services, including database connectivity and migrations, the Redis
//! cache, storage error types, account validation and password hashing, and
//! the bearer token claims both services agree on.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod cache;
pub mod claims;
pub mod database;
pub mod error;
