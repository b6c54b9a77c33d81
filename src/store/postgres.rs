//! Postgres-backed [`QrStore`].

use uuid::Uuid;

use super::{MarkOutcome, QrStore, StoreError};
use crate::{
    db::DbPool,
    models::{
        qr_code::QrRecord,
        review::{NewReview, Review},
    },
};

/// Column list shared by every query that returns a [`QrRecord`].
pub(crate) const QR_RECORD_COLUMNS: &str = "q.id, q.owner_id, q.is_enabled, q.is_scanned, \
     q.encrypted_payload, q.scanned_at, q.website_url, q.appearance, \
     p.enable_reviews, q.created_at";

#[derive(Clone)]
pub struct PgQrStore {
    pool: DbPool,
}

impl PgQrStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QrStore for PgQrStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<QrRecord>, StoreError> {
        let record = sqlx::query_as::<_, QrRecord>(&format!(
            "SELECT {QR_RECORD_COLUMNS}
             FROM qr_codes q
             JOIN profiles p ON p.id = q.owner_id
             WHERE q.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn mark_scanned(&self, id: Uuid) -> Result<MarkOutcome, StoreError> {
        // Single conditional UPDATE: Postgres row locking serializes racing
        // scans and only one of them sees a matching row.
        let scanned_at = sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
            r#"
            UPDATE qr_codes
            SET is_scanned = TRUE,
                scanned_at = NOW()
            WHERE id = $1
              AND is_enabled = TRUE
              AND is_scanned = FALSE
            RETURNING scanned_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match scanned_at {
            Some(at) => MarkOutcome::Marked(at),
            None => MarkOutcome::AlreadyScanned,
        })
    }

    async fn insert_review(&self, review: NewReview) -> Result<Option<Review>, StoreError> {
        let inserted = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (qr_code_id, rating, comment, image_urls)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (qr_code_id) DO NOTHING
            RETURNING id, qr_code_id, rating, comment, image_urls, created_at
            "#,
        )
        .bind(review.qr_code_id)
        .bind(review.rating)
        .bind(review.comment)
        .bind(review.image_urls)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted)
    }
}
