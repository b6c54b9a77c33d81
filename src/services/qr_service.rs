//! QR code management for the merchant dashboard.
//!
//! Merchants issue codes in batches, list them, and toggle the kill-switch.
//! Admins may read and toggle any code. Codes owned by someone else are
//! reported as not found.

use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    crypto::PayloadCipher,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::qr_code::{CreateQrCodesRequest, QrRecord},
    store::postgres::QR_RECORD_COLUMNS,
};

const MAX_BATCH: u32 = 500;
const MAX_URL_LEN: usize = 2048;

/// Issue `request.quantity` codes for one product.
///
/// # Process
///
/// 1. Validate product, website URL, appearance and quantity
/// 2. Encrypt the product once per code (each gets its own nonce)
/// 3. Insert all codes in one database transaction
///
/// # Errors
///
/// - `InvalidRequest`: validation failure
/// - `Crypto`: encryption failure
/// - `Database`: database error occurred (nothing is inserted)
pub async fn create_qr_codes(
    pool: &DbPool,
    cipher: &PayloadCipher,
    owner_id: Uuid,
    request: CreateQrCodesRequest,
) -> Result<Vec<QrRecord>, AppError> {
    validate_create(&request)?;

    let mut tx = pool.begin().await?;
    let mut records = Vec::with_capacity(request.quantity as usize);

    for _ in 0..request.quantity {
        let encrypted = cipher.encrypt(&request.product)?;

        let record = sqlx::query_as::<_, QrRecord>(&format!(
            r#"
            WITH q AS (
                INSERT INTO qr_codes (owner_id, encrypted_payload, website_url, appearance)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {QR_RECORD_COLUMNS}
            FROM q
            JOIN profiles p ON p.id = q.owner_id
            "#
        ))
        .bind(owner_id)
        .bind(encrypted)
        .bind(&request.website_url)
        .bind(Json(&request.appearance))
        .fetch_one(&mut *tx)
        .await?;

        records.push(record);
    }

    tx.commit().await?;

    tracing::info!(owner_id = %owner_id, count = records.len(), "QR codes issued");

    Ok(records)
}

/// List codes owned by `owner_id`, newest first.
pub async fn list_qr_codes(pool: &DbPool, owner_id: Uuid) -> Result<Vec<QrRecord>, AppError> {
    let records = sqlx::query_as::<_, QrRecord>(&format!(
        "SELECT {QR_RECORD_COLUMNS}
         FROM qr_codes q
         JOIN profiles p ON p.id = q.owner_id
         WHERE q.owner_id = $1
         ORDER BY q.created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Fetch one code visible to `auth`.
pub async fn get_qr_code(
    pool: &DbPool,
    auth: &AuthContext,
    qr_id: Uuid,
) -> Result<QrRecord, AppError> {
    let record = sqlx::query_as::<_, QrRecord>(&format!(
        "SELECT {QR_RECORD_COLUMNS}
         FROM qr_codes q
         JOIN profiles p ON p.id = q.owner_id
         WHERE q.id = $1"
    ))
    .bind(qr_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::QrCodeNotFound)?;

    if !auth.can_manage(record.owner_id) {
        return Err(AppError::QrCodeNotFound);
    }

    Ok(record)
}

/// Flip the kill-switch of a code visible to `auth`.
///
/// Disabling a code makes every later verification fail. Re-enabling does
/// not reset a consumed scan.
pub async fn set_enabled(
    pool: &DbPool,
    auth: &AuthContext,
    qr_id: Uuid,
    is_enabled: bool,
) -> Result<QrRecord, AppError> {
    let record = sqlx::query_as::<_, QrRecord>(&format!(
        r#"
        UPDATE qr_codes q
        SET is_enabled = $2
        FROM profiles p
        WHERE p.id = q.owner_id
          AND q.id = $1
          AND (q.owner_id = $3 OR $4)
        RETURNING {QR_RECORD_COLUMNS}
        "#
    ))
    .bind(qr_id)
    .bind(is_enabled)
    .bind(auth.user_id)
    .bind(auth.is_admin())
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::QrCodeNotFound)?;

    tracing::info!(qr_id = %qr_id, is_enabled, by = %auth.user_id, "QR code kill-switch updated");

    Ok(record)
}

/// Validate a create request.
///
/// # Rules
///
/// - `product` must not be `null`
/// - `website_url`, if present, must be http(s) and at most 2048 characters
/// - `appearance` must pass [`QrAppearance::validate`](crate::models::appearance::QrAppearance::validate)
/// - `quantity` between 1 and 500
fn validate_create(request: &CreateQrCodesRequest) -> Result<(), AppError> {
    if request.product.is_null() {
        return Err(AppError::InvalidRequest("product is required".to_string()));
    }

    if !(1..=MAX_BATCH).contains(&request.quantity) {
        return Err(AppError::InvalidRequest(format!(
            "quantity must be between 1 and {MAX_BATCH}"
        )));
    }

    if let Some(ref website) = request.website_url {
        if website.len() > MAX_URL_LEN {
            return Err(AppError::InvalidRequest(format!(
                "website_url exceeds {MAX_URL_LEN} characters"
            )));
        }
        let parsed = url::Url::parse(website)
            .map_err(|_| AppError::InvalidRequest("Invalid website_url".to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidRequest(
                "website_url must use HTTP or HTTPS".to_string(),
            ));
        }
    }

    request.appearance.validate().map_err(AppError::InvalidRequest)
}
