//! Review service - post-verification ratings and comments.
//!
//! A review is accepted only with a review token issued by a successful
//! verification of the same QR code, and only while the merchant has
//! reviews enabled.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    crypto::ReviewTokenSigner,
    db::DbPool,
    error::AppError,
    models::{
        qr_code::QrRecord,
        review::{NewReview, Review, SubmitReviewRequest},
        verification::ReviewInvite,
    },
    store::QrStore,
};

const MAX_COMMENT_CHARS: usize = 2000;
const MAX_IMAGES: usize = 5;
const MAX_URL_LEN: usize = 2048;

/// Issue a review invitation for a freshly verified record.
///
/// Returns `None` when the merchant has reviews turned off.
pub fn issue_invite(
    signer: &ReviewTokenSigner,
    record: &QrRecord,
    now: DateTime<Utc>,
    window_minutes: i64,
) -> Result<Option<ReviewInvite>, AppError> {
    if !record.enable_reviews {
        return Ok(None);
    }

    let expires_at = TimeDelta::try_minutes(window_minutes)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or(AppError::TimeOutOfRange("review token expiry"))?;
    let token = signer.issue(record.id, expires_at)?;

    Ok(Some(ReviewInvite { token, expires_at }))
}

/// Submit a review for `qr_id`.
///
/// # Process
///
/// 1. Check the review token against `qr_id` and `now`
/// 2. Re-read the record: it must be scanned and still accept reviews
/// 3. Validate rating, comment and image links
/// 4. Insert (at most one review per code)
///
/// # Errors
///
/// - `InvalidReviewToken`: bad, expired or foreign token, or record not scanned
/// - `QrCodeNotFound`: record vanished
/// - `ReviewsDisabled`: merchant turned reviews off
/// - `InvalidRequest`: validation failure
/// - `ReviewAlreadySubmitted`: a review exists for this code
pub async fn submit_review(
    store: &dyn QrStore,
    signer: &ReviewTokenSigner,
    qr_id: Uuid,
    request: SubmitReviewRequest,
    now: DateTime<Utc>,
) -> Result<Review, AppError> {
    signer.verify(&request.token, qr_id, now).map_err(|e| {
        tracing::info!(qr_id = %qr_id, reason = %e, "Review token rejected");
        AppError::InvalidReviewToken
    })?;

    let record = store.fetch(qr_id).await?.ok_or(AppError::QrCodeNotFound)?;

    if !record.is_scanned {
        return Err(AppError::InvalidReviewToken);
    }
    if !record.enable_reviews {
        return Err(AppError::ReviewsDisabled);
    }

    let review = validate_review(qr_id, request)?;

    store
        .insert_review(review)
        .await?
        .ok_or(AppError::ReviewAlreadySubmitted)
}

/// List reviews of a QR code, newest first.
pub async fn list_reviews(pool: &DbPool, qr_id: Uuid) -> Result<Vec<Review>, AppError> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT id, qr_code_id, rating, comment, image_urls, created_at
         FROM reviews
         WHERE qr_code_id = $1
         ORDER BY created_at DESC",
    )
    .bind(qr_id)
    .fetch_all(pool)
    .await?;

    Ok(reviews)
}

/// Validate a submission into a storable review.
///
/// # Rules
///
/// - Rating between 1 and 5
/// - Comment trimmed; blank becomes `None`; at most 2000 characters
/// - At most 5 image links, each HTTPS and at most 2048 characters
fn validate_review(qr_id: Uuid, request: SubmitReviewRequest) -> Result<NewReview, AppError> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::InvalidRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let comment = request
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if let Some(ref c) = comment {
        if c.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::InvalidRequest(format!(
                "Comment exceeds {MAX_COMMENT_CHARS} characters"
            )));
        }
    }

    if request.images.len() > MAX_IMAGES {
        return Err(AppError::InvalidRequest(format!(
            "At most {MAX_IMAGES} images are allowed"
        )));
    }
    for image in &request.images {
        validate_image_url(image)?;
    }

    Ok(NewReview {
        qr_code_id: qr_id,
        rating: request.rating,
        comment,
        image_urls: request.images,
    })
}

fn validate_image_url(url: &str) -> Result<(), AppError> {
    if url.len() > MAX_URL_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Image URL exceeds {MAX_URL_LEN} characters"
        )));
    }

    let parsed = url::Url::parse(url)
        .map_err(|_| AppError::InvalidRequest("Invalid image URL".to_string()))?;

    if parsed.scheme() != "https" {
        return Err(AppError::InvalidRequest(
            "Image URLs must use HTTPS".to_string(),
        ));
    }

    Ok(())
}
