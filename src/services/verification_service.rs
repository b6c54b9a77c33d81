//! Verification service - one-time QR scan validation.
//!
//! # Transition Rule
//!
//! 1. No identifier: `MissingIdentifier`, the store is not touched
//! 2. Unknown/unparseable id or store failure: rejected
//! 3. Disabled or already scanned: rejected, no write
//! 4. Payload fails to decrypt: rejected, no write (record stays unscanned)
//! 5. Otherwise a conditional update marks the record scanned. Only the
//!    caller whose update matched a row is verified; a lost race is rejected
//!    as `AlreadyScanned`.
//!
//! Every rejection except `MissingIdentifier` is shown to the scanner as the
//! same `not_authentic` outcome. The specific kind is only logged.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    crypto::{CryptoError, PayloadCipher},
    models::qr_code::QrRecord,
    store::{MarkOutcome, QrStore, StoreError},
};

/// Why a verification did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("No QR identifier supplied")]
    MissingIdentifier,

    #[error("QR record not found")]
    RecordNotFound,

    #[error("QR record disabled")]
    RecordDisabled,

    #[error("QR record already scanned")]
    AlreadyScanned,

    #[error("Payload decryption failed: {0}")]
    DecryptionFailure(#[source] CryptoError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl VerificationError {
    /// Stable name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationError::MissingIdentifier => "missing_identifier",
            VerificationError::RecordNotFound => "record_not_found",
            VerificationError::RecordDisabled => "record_disabled",
            VerificationError::AlreadyScanned => "already_scanned",
            VerificationError::DecryptionFailure(_) => "decryption_failure",
            VerificationError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// A successful first scan.
#[derive(Debug, Clone)]
pub struct VerifiedScan {
    /// Record as read before the update
    pub record: QrRecord,

    /// Timestamp written by the conditional update
    pub scanned_at: DateTime<Utc>,

    /// Decrypted product data
    pub product: serde_json::Value,
}

/// Verify a raw identifier taken from the request.
///
/// # Arguments
///
/// * `store` - QR record store
/// * `cipher` - payload cipher
/// * `raw_id` - `id` query parameter, if any
///
/// # Errors
///
/// See [`VerificationError`]. Callers must treat every variant other than
/// `MissingIdentifier` as "not authentic".
pub async fn verify(
    store: &dyn QrStore,
    cipher: &PayloadCipher,
    raw_id: Option<&str>,
) -> Result<VerifiedScan, VerificationError> {
    let result = run(store, cipher, raw_id).await;

    match &result {
        Ok(scan) => {
            tracing::info!(qr_id = %scan.record.id, "QR code verified");
        }
        Err(e @ (VerificationError::StoreUnavailable(_) | VerificationError::DecryptionFailure(_))) => {
            tracing::warn!(reason = e.kind(), error = %e, raw_id = ?raw_id, "QR verification rejected");
        }
        Err(e) => {
            tracing::info!(reason = e.kind(), raw_id = ?raw_id, "QR verification rejected");
        }
    }

    result
}

async fn run(
    store: &dyn QrStore,
    cipher: &PayloadCipher,
    raw_id: Option<&str>,
) -> Result<VerifiedScan, VerificationError> {
    // Step 1: Require an identifier
    let raw_id = raw_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(VerificationError::MissingIdentifier)?;

    // An id that is not a UUID cannot exist in the store
    let id = Uuid::parse_str(raw_id).map_err(|_| VerificationError::RecordNotFound)?;

    // Step 2: Fetch
    let record = store
        .fetch(id)
        .await?
        .ok_or(VerificationError::RecordNotFound)?;

    // Step 3: Flags
    if !record.is_enabled {
        return Err(VerificationError::RecordDisabled);
    }
    if record.is_scanned {
        return Err(VerificationError::AlreadyScanned);
    }

    // Step 4: Decrypt before consuming the scan
    let product = cipher
        .decrypt(&record.encrypted_payload)
        .map_err(VerificationError::DecryptionFailure)?;

    // Step 5: Compare-and-set; losing here means another scan won the race
    match store.mark_scanned(id).await? {
        MarkOutcome::Marked(scanned_at) => Ok(VerifiedScan {
            record,
            scanned_at,
            product,
        }),
        MarkOutcome::AlreadyScanned => Err(VerificationError::AlreadyScanned),
    }
}
