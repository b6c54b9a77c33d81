//! In-memory [`QrStore`] for tests.
//!
//! Every call yields to the scheduler first so concurrent callers interleave
//! the way they would against a real database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{MarkOutcome, QrStore, StoreError};
use crate::models::{
    qr_code::QrRecord,
    review::{NewReview, Review},
};

#[derive(Default)]
pub struct MemoryQrStore {
    records: Mutex<HashMap<Uuid, QrRecord>>,
    reviews: Mutex<Vec<Review>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryQrStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: QrRecord) {
        self.records.lock().insert(record.id, record);
    }

    /// Snapshot of a record.
    pub fn get(&self, id: Uuid) -> Option<QrRecord> {
        self.records.lock().get(&id).cloned()
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.lock().clone()
    }

    /// Number of `fetch` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `mark_scanned` calls that changed a record.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QrStore for MemoryQrStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<QrRecord>, StoreError> {
        tokio::task::yield_now().await;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().get(&id).cloned())
    }

    async fn mark_scanned(&self, id: Uuid) -> Result<MarkOutcome, StoreError> {
        tokio::task::yield_now().await;
        let mut records = self.records.lock();

        match records.get_mut(&id) {
            Some(record) if record.is_enabled && !record.is_scanned => {
                let now = Utc::now();
                record.is_scanned = true;
                record.scanned_at = Some(now);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(MarkOutcome::Marked(now))
            }
            _ => Ok(MarkOutcome::AlreadyScanned),
        }
    }

    async fn insert_review(&self, review: NewReview) -> Result<Option<Review>, StoreError> {
        tokio::task::yield_now().await;
        let mut reviews = self.reviews.lock();

        if reviews.iter().any(|r| r.qr_code_id == review.qr_code_id) {
            return Ok(None);
        }

        let stored = Review {
            id: Uuid::new_v4(),
            qr_code_id: review.qr_code_id,
            rating: review.rating,
            comment: review.comment,
            image_urls: review.image_urls,
            created_at: Utc::now(),
        };
        reviews.push(stored.clone());

        Ok(Some(stored))
    }
}
