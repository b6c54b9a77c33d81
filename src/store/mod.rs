//! QR record store.
//!
//! Verification and review submission go through the [`QrStore`] trait so the
//! one-time scan rule can be exercised against any backend. The production
//! backend is Postgres; tests use an in-memory store.
//!
//! # Concurrency Contract
//!
//! [`QrStore::mark_scanned`] must be a compare-and-set: of any number of
//! concurrent calls for the same fresh record, exactly one returns
//! [`MarkOutcome::Marked`].

#[cfg(test)]
pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    qr_code::QrRecord,
    review::{NewReview, Review},
};

#[cfg(test)]
pub use memory::MemoryQrStore;
pub use postgres::PgQrStore;

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a conditional scan update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// This call flipped `is_scanned`; carries the stored `scanned_at`.
    Marked(DateTime<Utc>),

    /// The record was already scanned, disabled, or gone.
    AlreadyScanned,
}

/// Persistent storage for QR records and their reviews.
#[async_trait::async_trait]
pub trait QrStore: Send + Sync {
    /// Fetch a record by id.
    async fn fetch(&self, id: Uuid) -> Result<Option<QrRecord>, StoreError>;

    /// Set `is_scanned` and `scanned_at` iff the record is enabled and unscanned.
    async fn mark_scanned(&self, id: Uuid) -> Result<MarkOutcome, StoreError>;

    /// Append a review. Returns `None` if the code already has one.
    async fn insert_review(&self, review: NewReview) -> Result<Option<Review>, StoreError>;
}
