//! Database repositories for data access layer
//!
//! The API only touches the image columns of vote options. Everything else
//! in the trip schema is owned by the hosted platform.

pub mod vote_option;

pub use vote_option::{VoteOptionRepository, VoteOptionStore};

use sqlx::PgPool;

/// Apply the bundled migrations. Only used for local development databases.
pub async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
