//! Review models.
//!
//! A review may only be written after a genuine verification and only when
//! the issuing merchant has reviews enabled. Each QR code holds at most one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a review record from the database.
///
/// # Database Table
///
/// Maps to the `reviews` table (unique on `qr_code_id`).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub qr_code_id: Uuid,

    /// 1 to 5 stars
    pub rating: i16,

    pub comment: Option<String>,

    /// Attachment links uploaded to object storage by the client
    pub image_urls: Vec<String>,

    pub created_at: DateTime<Utc>,
}

/// A validated review ready to be stored.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub qr_code_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub image_urls: Vec<String>,
}

/// Request body for `POST /verify/{id}/reviews`.
///
/// # JSON Example
///
/// ```json
/// {
///   "token": "1767225600.9f86d081884c7d65...",
///   "rating": 5,
///   "comment": "Genuine, fast delivery",
///   "images": ["https://cdn.example.com/u/abc.jpg"]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    /// Review token returned by the verified response
    pub token: String,

    pub rating: i16,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,
}
