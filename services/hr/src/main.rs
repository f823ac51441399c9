use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod assistant;
mod authority;
mod clock;
mod config;
mod dashboard;
mod error;
mod geo;
mod geofence;
mod leave;
mod ledger;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod timeclock;

#[cfg(test)]
mod testing;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{config::AppConfig, middleware::JwtVerifier, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting HR service");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt = JwtVerifier::from_env()?;
    let bind = config.server.bind.clone();
    let app_state = AppState::new(pool, config, jwt)?;

    info!(
        admin_role = %app_state.config.authority.admin_role,
        utc_offset_minutes = app_state.config.attendance.utc_offset_minutes,
        assistant_enabled = app_state.assistant.is_enabled(),
        "HR service initialized successfully"
    );

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&bind).await?;
    info!("HR service listening on {}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
