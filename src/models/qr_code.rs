//! QR code data models and API request/response types.
//!
//! This module defines:
//! - `QrRecord`: one printed authentication token, as read by verification
//! - `CreateQrCodesRequest` / `UpdateQrCodeRequest`: dashboard request bodies
//! - `QrCodeResponse`: what merchants see (never the encrypted payload)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use super::appearance::QrAppearance;

/// Represents a QR code record from the database.
///
/// # Database Table
///
/// Maps to the `qr_codes` table joined with the owner's `enable_reviews`
/// flag from `profiles`.
///
/// # Scan State
///
/// `is_scanned` goes from false to true exactly once, together with
/// `scanned_at`, and never goes back.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QrRecord {
    /// Identifier embedded in the verification URL
    pub id: Uuid,

    /// Merchant profile that issued this code
    pub owner_id: Uuid,

    /// Kill-switch; disabled codes never verify
    pub is_enabled: bool,

    pub is_scanned: bool,

    /// Base64 AES-GCM-SIV blob holding the product JSON
    pub encrypted_payload: String,

    pub scanned_at: Option<DateTime<Utc>>,

    pub website_url: Option<String>,

    pub appearance: Json<QrAppearance>,

    /// Owner's review setting at read time
    pub enable_reviews: bool,

    pub created_at: DateTime<Utc>,
}

/// Request body for creating QR codes.
///
/// # JSON Example
///
/// ```json
/// {
///   "product": {"name": "Arabica 250g", "batch": "B-2291"},
///   "website_url": "https://shop.example.com/arabica",
///   "appearance": {"template": "rounded"},
///   "quantity": 100
/// }
/// ```
///
/// # Validation
///
/// - `product`: any JSON value except `null`
/// - `website_url`: optional, http(s) only
/// - `quantity`: 1 to 500, defaults to 1
#[derive(Debug, Deserialize)]
pub struct CreateQrCodesRequest {
    pub product: serde_json::Value,

    #[serde(default)]
    pub website_url: Option<String>,

    #[serde(default)]
    pub appearance: QrAppearance,

    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Request body for `PATCH /api/v1/qr-codes/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQrCodeRequest {
    pub is_enabled: bool,
}

/// Response body for QR code endpoints.
#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    pub id: Uuid,

    /// Link to encode into the printed QR image
    pub verification_url: String,

    pub is_enabled: bool,
    pub is_scanned: bool,
    pub scanned_at: Option<DateTime<Utc>>,
    pub website_url: Option<String>,
    pub appearance: QrAppearance,
    pub created_at: DateTime<Utc>,
}

impl QrCodeResponse {
    /// Build a response, attaching the verification link under `base_url`.
    pub fn from_record(record: QrRecord, base_url: &url::Url) -> Self {
        Self {
            verification_url: verification_url(base_url, record.id),
            id: record.id,
            is_enabled: record.is_enabled,
            is_scanned: record.is_scanned,
            scanned_at: record.scanned_at,
            website_url: record.website_url,
            appearance: record.appearance.0,
            created_at: record.created_at,
        }
    }
}

/// `{base}/verify?id={id}`, keeping any path prefix of `base`.
pub fn verification_url(base_url: &url::Url, id: Uuid) -> String {
    let mut url = base_url.clone();
    let path = format!("{}/verify", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut()
        .clear()
        .append_pair("id", &id.to_string());
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_url_at_root() {
        let base = url::Url::parse("https://verify.example.com").expect("url");
        let id = Uuid::nil();
        assert_eq!(
            verification_url(&base, id),
            format!("https://verify.example.com/verify?id={id}")
        );
    }

    #[test]
    fn test_verification_url_keeps_prefix() {
        let base = url::Url::parse("https://example.com/qr/").expect("url");
        let id = Uuid::nil();
        assert_eq!(
            verification_url(&base, id),
            format!("https://example.com/qr/verify?id={id}")
        );
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateQrCodesRequest =
            serde_json::from_str(r#"{"product": {"name": "x"}}"#).expect("parse");
        assert_eq!(request.quantity, 1);
        assert_eq!(request.appearance, QrAppearance::default());
        assert!(request.website_url.is_none());
    }
}
