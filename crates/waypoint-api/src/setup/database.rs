//! Database setup and initialization

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use waypoint_core::Config;
use waypoint_db::{VoteOptionRepository, VoteOptionStore};

/// Connect to the database when one is configured.
///
/// Failures are logged and yield `None`; the backfill endpoint then reports
/// the missing database.
pub async fn setup_database(config: &Config) -> Option<Arc<dyn VoteOptionStore>> {
    let Some(database_url) = config.database_url() else {
        tracing::warn!("DATABASE_URL not set, backfill endpoint disabled");
        return None;
    };

    match connect(config, database_url).await {
        Ok(pool) => Some(Arc::new(VoteOptionRepository::new(pool))),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Database setup failed, backfill endpoint disabled");
            None
        }
    }
}

async fn connect(config: &Config, database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    if config.run_migrations() {
        waypoint_db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
