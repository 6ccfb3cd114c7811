//! In-memory vote option store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;
use waypoint_core::models::{VoteOptionImageUpdate, VoteOptionImages};
use waypoint_core::AppError;
use waypoint_db::VoteOptionStore;

#[derive(Default)]
pub struct InMemoryVoteOptionStore {
    rows: Mutex<Vec<(String, VoteOptionImages)>>,
    list_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl InMemoryVoteOptionStore {
    pub fn with_rows(trip_id: &str, rows: Vec<VoteOptionImages>) -> Self {
        let store = Self::default();
        store
            .rows
            .lock()
            .unwrap()
            .extend(rows.into_iter().map(|r| (trip_id.to_string(), r)));
        store
    }

    pub fn row(&self, id: Uuid) -> Option<VoteOptionImages> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|(_, r)| r.id == id)
            .map(|(_, r)| r.clone())
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoteOptionStore for InMemoryVoteOptionStore {
    async fn list_for_trip(
        &self,
        trip_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VoteOptionImages>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(trip, _)| trip == trip_id)
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn update_images(
        &self,
        id: Uuid,
        update: &VoteOptionImageUpdate,
    ) -> Result<(), AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let (_, row) = rows
            .iter_mut()
            .find(|(_, r)| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("vote option {}", id)))?;
        if let Some(image_url) = &update.image_url {
            row.image_url = Some(image_url.clone());
        }
        if let Some(photos) = &update.photo_urls {
            row.photo_urls = Some(photos.clone());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
