//! Public verification endpoints.
//!
//! - GET /verify?id=<uuid> - Verify a scanned QR code
//! - POST /verify/{id}/reviews - Review a product after a successful verification

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        review::{Review, SubmitReviewRequest},
        verification::{VerificationResponse, VerifyQuery},
    },
    services::{
        review_service,
        verification_service::{self, VerificationError},
    },
    state::AppState,
};

/// Verify a scanned QR code.
///
/// # Responses
///
/// - **200** `{"status": "verified", ...}` - first genuine scan; includes the
///   decrypted product and, if the merchant allows it, a review invitation
/// - **200** `{"status": "not_authentic"}` - anything else (unknown, disabled,
///   already scanned, corrupt, or store failure)
/// - **400** `{"status": "missing_identifier"}` - no `id` supplied
///
/// A query string that cannot be parsed (e.g. a repeated `id`) is answered
/// `not_authentic` without touching the store.
pub async fn verify_qr_code(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> impl IntoResponse {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::info!(reason = "malformed_query", error = %rejection, "QR verification rejected");
            return (StatusCode::OK, Json(VerificationResponse::NotAuthentic));
        }
    };

    let result =
        verification_service::verify(state.store.as_ref(), &state.cipher, query.id.as_deref())
            .await;

    match result {
        Ok(scan) => {
            // An invite failure must not turn a consumed scan into an error
            let review = review_service::issue_invite(
                &state.review_tokens,
                &scan.record,
                Utc::now(),
                state.config.review_window_minutes,
            )
            .unwrap_or_else(|e| {
                tracing::error!(qr_id = %scan.record.id, "Failed to issue review token: {:?}", e);
                None
            });

            let body = VerificationResponse::Verified {
                qr_id: scan.record.id,
                scanned_at: scan.scanned_at,
                product: scan.product,
                website_url: scan.record.website_url,
                appearance: scan.record.appearance.0,
                review,
            };
            (StatusCode::OK, Json(body))
        }
        Err(VerificationError::MissingIdentifier) => (
            StatusCode::BAD_REQUEST,
            Json(VerificationResponse::MissingIdentifier),
        ),
        Err(_) => (StatusCode::OK, Json(VerificationResponse::NotAuthentic)),
    }
}

/// Submit a review for a verified QR code.
///
/// # Request Body
///
/// ```json
/// {
///   "token": "1767225600.9f86d0...",
///   "rating": 5,
///   "comment": "Genuine",
///   "images": []
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the stored review
/// - **403**: invalid/expired token or reviews disabled
/// - **409**: a review already exists for this code
pub async fn submit_review(
    State(state): State<AppState>,
    Path(qr_id): Path<Uuid>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = review_service::submit_review(
        state.store.as_ref(),
        &state.review_tokens,
        qr_id,
        request,
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}
