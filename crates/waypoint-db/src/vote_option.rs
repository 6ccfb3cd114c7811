use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use waypoint_core::models::{VoteOptionImageUpdate, VoteOptionImages};
use waypoint_core::AppError;

/// Read/write access to the image columns of vote options.
///
/// Implemented by `VoteOptionRepository` for Postgres and by in-memory
/// stores in tests.
#[async_trait]
pub trait VoteOptionStore: Send + Sync {
    /// One page of a trip's vote options, oldest first.
    async fn list_for_trip(
        &self,
        trip_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VoteOptionImages>, AppError>;

    /// Write the changed image columns of one row.
    async fn update_images(&self, id: Uuid, update: &VoteOptionImageUpdate)
        -> Result<(), AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Repository for vote option images
#[derive(Clone)]
pub struct VoteOptionRepository {
    pool: PgPool,
}

impl VoteOptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteOptionStore for VoteOptionRepository {
    #[tracing::instrument(skip(self), fields(db.table = "vote_options", db.operation = "select"))]
    async fn list_for_trip(
        &self,
        trip_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VoteOptionImages>, AppError> {
        let Some(trip_id) = parse_trip_id(trip_id) else {
            tracing::debug!(trip_id = %trip_id, "Trip id is not a UUID, returning empty page");
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<Postgres, VoteOptionImages>(
            r#"
            SELECT vo.id, vo.image_url, vo.photo_urls
            FROM vote_options vo
            INNER JOIN vote_categories vc ON vc.id = vo.category_id
            WHERE vc.trip_id = $1
            ORDER BY vo.created_at ASC, vo.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(trip_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "vote_options", db.operation = "update"))]
    async fn update_images(
        &self,
        id: Uuid,
        update: &VoteOptionImageUpdate,
    ) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE vote_options
            SET image_url = COALESCE($2, image_url),
                photo_urls = COALESCE($3, photo_urls)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.image_url.as_deref())
        .bind(update.photo_urls.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Trip ids are UUIDs; anything else cannot match a row.
fn parse_trip_id(trip_id: &str) -> Option<Uuid> {
    Uuid::parse_str(trip_id.trim()).ok()
}
