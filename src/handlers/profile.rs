//! Profile HTTP handlers.
//!
//! - GET /api/v1/profile - Current user, trial and subscription status
//! - POST /api/v1/profile/trial - Start the free trial
//! - PATCH /api/v1/profile/settings - Update merchant settings
//!
//! These require authentication but not dashboard access, so a merchant
//! without a plan can still see their status and start a trial.

use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::profile::{ProfileResponse, UpdateSettingsRequest},
    services::profile_service,
    state::AppState,
};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = profile_service::get_profile(&state.pool, auth.user_id).await?;

    Ok(Json(profile_service::to_response(profile, Utc::now())))
}

/// Start the free trial.
///
/// # Response
///
/// - **200 OK**: updated profile with `trial_status: "active"`
/// - **409**: trial already started or expired
pub async fn start_trial(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, AppError> {
    let now = Utc::now();
    let profile =
        profile_service::start_trial(&state.pool, auth.user_id, state.config.trial_days, now)
            .await?;

    Ok(Json(profile_service::to_response(profile, now)))
}

/// Update merchant settings.
///
/// # Request Body
///
/// ```json
/// { "enable_reviews": true }
/// ```
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile =
        profile_service::update_settings(&state.pool, auth.user_id, request.enable_reviews)
            .await?;

    Ok(Json(profile_service::to_response(profile, Utc::now())))
}
