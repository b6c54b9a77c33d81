//! Error types and HTTP error response handling.
//!
//! This module defines the dashboard/review API errors and how they are
//! converted into HTTP responses. Verification does not use these: its
//! failures collapse into a `not_authentic` body (see
//! `services::verification_service`).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{crypto::CryptoError, store::StoreError};

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed. Details are logged, never returned.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing, unknown or expired session token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but neither a trial nor a subscription is active.
    #[error("An active trial or subscription is required")]
    SubscriptionRequired,

    /// Authenticated, but the resource belongs to someone else.
    #[error("Forbidden")]
    Forbidden,

    #[error("QR code not found")]
    QrCodeNotFound,

    #[error("Checkout session not found")]
    CheckoutSessionNotFound,

    /// Request body or parameters are invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Review token is missing, forged, expired or issued for another code.
    #[error("Invalid or expired review token")]
    InvalidReviewToken,

    #[error("Reviews are disabled for this product")]
    ReviewsDisabled,

    #[error("A review was already submitted for this code")]
    ReviewAlreadySubmitted,

    /// Trial can only be started once.
    #[error("Trial already started")]
    TrialUnavailable,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The provider has not confirmed payment for a session returned as paid.
    #[error("Payment has not been confirmed")]
    PaymentNotConfirmed,

    /// Hosted checkout provider failed or returned garbage.
    #[error("Checkout provider error: {0}")]
    CheckoutProvider(String),

    /// A timestamp computation left chrono's supported range.
    #[error("Time out of range: {0}")]
    TimeOutOfRange(&'static str),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Internal failures (`Database`, `Crypto`, `CheckoutProvider`) are logged
/// and replaced with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::SubscriptionRequired => (
                StatusCode::FORBIDDEN,
                "subscription_required",
                self.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::QrCodeNotFound => {
                (StatusCode::NOT_FOUND, "qr_code_not_found", self.to_string())
            }
            AppError::CheckoutSessionNotFound => (
                StatusCode::NOT_FOUND,
                "checkout_session_not_found",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::InvalidReviewToken => (
                StatusCode::FORBIDDEN,
                "invalid_review_token",
                self.to_string(),
            ),
            AppError::ReviewsDisabled => {
                (StatusCode::FORBIDDEN, "reviews_disabled", self.to_string())
            }
            AppError::ReviewAlreadySubmitted => (
                StatusCode::CONFLICT,
                "review_already_submitted",
                self.to_string(),
            ),
            AppError::TrialUnavailable => {
                (StatusCode::CONFLICT, "trial_unavailable", self.to_string())
            }
            AppError::PaymentNotConfirmed => (
                StatusCode::CONFLICT,
                "payment_not_confirmed",
                self.to_string(),
            ),
            AppError::CheckoutProvider(ref msg) => {
                tracing::error!("Checkout provider failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "checkout_unavailable",
                    "Payment provider is unavailable".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::TimeOutOfRange(what) => {
                tracing::error!("Time out of range: {}", what);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Crypto(ref e) => {
                tracing::error!("Crypto failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::SubscriptionRequired, StatusCode::FORBIDDEN),
            (AppError::QrCodeNotFound, StatusCode::NOT_FOUND),
            (
                AppError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::ReviewAlreadySubmitted, StatusCode::CONFLICT),
            (AppError::PaymentNotConfirmed, StatusCode::CONFLICT),
            (
                AppError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::CheckoutProvider("502".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
