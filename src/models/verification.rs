//! Verification request and response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::appearance::QrAppearance;

/// Query string of `GET /verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// Invitation to leave a review, present only when the merchant enables reviews.
#[derive(Debug, Serialize)]
pub struct ReviewInvite {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of every verification response.
///
/// # JSON Examples
///
/// ```json
/// {"status": "verified", "qr_id": "…", "scanned_at": "…", "product": {…}, …}
/// {"status": "not_authentic"}
/// {"status": "missing_identifier"}
/// ```
///
/// `not_authentic` deliberately carries no reason.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResponse {
    Verified {
        qr_id: Uuid,
        scanned_at: DateTime<Utc>,
        product: serde_json::Value,
        website_url: Option<String>,
        appearance: QrAppearance,
        #[serde(skip_serializing_if = "Option::is_none")]
        review: Option<ReviewInvite>,
    },
    NotAuthentic,
    MissingIdentifier,
}
