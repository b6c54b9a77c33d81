//! Profile service - merchant account status and settings.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::profile::{Profile, ProfileResponse},
};

const PROFILE_COLUMNS: &str =
    "id, email, role, trial_status, trial_ends_at, subscription_status, enable_reviews";

/// Load a profile by id.
pub async fn get_profile(pool: &DbPool, user_id: Uuid) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Unauthorized)
}

/// Start the free trial.
///
/// Only possible from `not_started`; the status check and update are a single
/// statement, so two concurrent requests cannot both start a trial.
pub async fn start_trial(
    pool: &DbPool,
    user_id: Uuid,
    trial_days: i64,
    now: DateTime<Utc>,
) -> Result<Profile, AppError> {
    let ends_at = trial_end(now, trial_days)?;

    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles
        SET trial_status = 'active',
            trial_ends_at = $2,
            updated_at = NOW()
        WHERE id = $1 AND trial_status = 'not_started'
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(ends_at)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::TrialUnavailable)?;

    tracing::info!(user_id = %user_id, %ends_at, "Trial started");

    Ok(profile)
}

/// End of a trial of `trial_days` starting at `now`.
fn trial_end(now: DateTime<Utc>, trial_days: i64) -> Result<DateTime<Utc>, AppError> {
    TimeDelta::try_days(trial_days)
        .and_then(|length| now.checked_add_signed(length))
        .ok_or(AppError::TimeOutOfRange("trial end"))
}

/// Turn post-verification reviews on or off for all of a merchant's codes.
pub async fn update_settings(
    pool: &DbPool,
    user_id: Uuid,
    enable_reviews: bool,
) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles
        SET enable_reviews = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(enable_reviews)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Unauthorized)
}

/// Build the API view of a profile as of `now`.
pub fn to_response(profile: Profile, now: DateTime<Utc>) -> ProfileResponse {
    let context = AuthContext::from_profile(&profile, now);

    ProfileResponse {
        id: profile.id,
        email: profile.email,
        role: context.role,
        trial_status: context.trial_status,
        trial_ends_at: profile.trial_ends_at,
        subscription_status: context.subscription_status,
        enable_reviews: profile.enable_reviews,
        dashboard_access: context.has_dashboard_access(),
    }
}
