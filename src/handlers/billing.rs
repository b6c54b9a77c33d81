//! Billing HTTP handlers.
//!
//! - POST /api/v1/billing/checkout - Create a hosted checkout session
//! - GET /api/v1/billing/return - Resolve a session once the provider confirms it

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::checkout::{CheckoutRequest, CheckoutResponse, CheckoutReturnQuery, CheckoutSession},
    services::checkout_service,
    state::AppState,
};

/// Create a checkout session.
///
/// # Request Body
///
/// ```json
/// { "plan": "monthly" }
/// ```
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "session_id": "cs_test_a1b2c3",
///   "redirect_url": "https://checkout.example.com/pay/cs_test_a1b2c3"
/// }
/// ```
///
/// The client navigates the browser to `redirect_url`.
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let response =
        checkout_service::start_checkout(&state.pool, &state.checkout, auth.user_id, request.plan)
            .await?;

    Ok(Json(response))
}

/// Resolve a checkout session after the provider redirects back.
///
/// # Query
///
/// `?session_id=cs_test_a1b2c3&outcome=success`
///
/// The provider is asked for the session's payment status; `outcome` alone
/// never activates a subscription (409 `payment_not_confirmed`).
pub async fn checkout_return(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CheckoutReturnQuery>,
) -> Result<Json<CheckoutSession>, AppError> {
    let session = checkout_service::complete_checkout(
        &state.pool,
        &state.checkout,
        auth.user_id,
        &query.session_id,
        query.outcome,
    )
    .await?;

    Ok(Json(session))
}
