//! QR code management HTTP handlers.
//!
//! This module implements the dashboard QR endpoints:
//! - POST /api/v1/qr-codes - Issue a batch of codes for one product
//! - GET /api/v1/qr-codes - List own codes
//! - GET /api/v1/qr-codes/{id} - Get one code
//! - PATCH /api/v1/qr-codes/{id} - Enable or disable a code
//! - GET /api/v1/qr-codes/{id}/reviews - Reviews left for a code
//!
//! All routes require authentication and dashboard access.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        qr_code::{CreateQrCodesRequest, QrCodeResponse, UpdateQrCodeRequest},
        review::Review,
    },
    services::{qr_service, review_service},
    state::AppState,
};

/// Issue QR codes.
///
/// # Request Body
///
/// ```json
/// {
///   "product": {"name": "Arabica 250g", "batch": "B-2291"},
///   "website_url": "https://shop.example.com/arabica",
///   "appearance": {"template": "rounded"},
///   "quantity": 2
/// }
/// ```
///
/// # Response (201 Created)
///
/// Array of created codes, each with the `verification_url` to print.
pub async fn create_qr_codes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateQrCodesRequest>,
) -> Result<(StatusCode, Json<Vec<QrCodeResponse>>), AppError> {
    let records =
        qr_service::create_qr_codes(&state.pool, &state.cipher, auth.user_id, request).await?;

    let responses = records
        .into_iter()
        .map(|r| QrCodeResponse::from_record(r, &state.public_base_url))
        .collect();

    Ok((StatusCode::CREATED, Json(responses)))
}

/// List the caller's QR codes, newest first.
pub async fn list_qr_codes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<QrCodeResponse>>, AppError> {
    let records = qr_service::list_qr_codes(&state.pool, auth.user_id).await?;

    Ok(Json(
        records
            .into_iter()
            .map(|r| QrCodeResponse::from_record(r, &state.public_base_url))
            .collect(),
    ))
}

/// Get one QR code.
///
/// Returns 404 if the code does not exist OR belongs to another merchant
/// (admins can see every code).
pub async fn get_qr_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(qr_id): Path<Uuid>,
) -> Result<Json<QrCodeResponse>, AppError> {
    let record = qr_service::get_qr_code(&state.pool, &auth, qr_id).await?;

    Ok(Json(QrCodeResponse::from_record(
        record,
        &state.public_base_url,
    )))
}

/// Enable or disable a QR code.
///
/// # Request Body
///
/// ```json
/// { "is_enabled": false }
/// ```
pub async fn update_qr_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(qr_id): Path<Uuid>,
    Json(request): Json<UpdateQrCodeRequest>,
) -> Result<Json<QrCodeResponse>, AppError> {
    let record = qr_service::set_enabled(&state.pool, &auth, qr_id, request.is_enabled).await?;

    Ok(Json(QrCodeResponse::from_record(
        record,
        &state.public_base_url,
    )))
}

/// List reviews left for a QR code.
pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(qr_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    // Ownership check
    qr_service::get_qr_code(&state.pool, &auth, qr_id).await?;

    let reviews = review_service::list_reviews(&state.pool, qr_id).await?;

    Ok(Json(reviews))
}
