//! Merchant profile model and account status.
//!
//! Status columns are stored as TEXT. Unknown values decode to the least
//! privileged variant so a bad row can never widen access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Merchant,
    Admin,
}

impl Role {
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::Merchant,
        }
    }
}

/// Free trial state of a merchant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    NotStarted,
    Active,
    Expired,
}

impl TrialStatus {
    pub fn from_db(value: &str) -> Self {
        match value {
            "not_started" => Self::NotStarted,
            "active" => Self::Active,
            _ => Self::Expired,
        }
    }
}

/// Paid subscription state of a merchant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    None,
    Active,
    Canceled,
}

impl SubscriptionStatus {
    pub fn from_db(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "canceled" => Self::Canceled,
            _ => Self::None,
        }
    }
}

/// Represents a profile record from the database.
///
/// # Database Table
///
/// Maps to the `profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub trial_status: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_status: String,

    /// Whether verified customers may leave a review on this merchant's codes
    pub enable_reviews: bool,
}

impl Profile {
    /// Trial status as of `now`.
    ///
    /// An `active` trial whose end date has passed reports `Expired`; the row
    /// itself is not rewritten.
    pub fn trial_status_at(&self, now: DateTime<Utc>) -> TrialStatus {
        match TrialStatus::from_db(&self.trial_status) {
            TrialStatus::Active => match self.trial_ends_at {
                Some(ends_at) if ends_at > now => TrialStatus::Active,
                _ => TrialStatus::Expired,
            },
            other => other,
        }
    }
}

/// Response body for `GET /api/v1/profile`.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub trial_status: TrialStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_status: SubscriptionStatus,
    pub enable_reviews: bool,
    pub dashboard_access: bool,
}

/// Request body for `PATCH /api/v1/profile/settings`.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub enable_reviews: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(trial_status: &str, trial_ends_at: Option<DateTime<Utc>>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "shop@example.com".to_string(),
            role: "merchant".to_string(),
            trial_status: trial_status.to_string(),
            trial_ends_at,
            subscription_status: "none".to_string(),
            enable_reviews: false,
        }
    }

    #[test]
    fn test_active_trial_before_end() {
        let now = Utc::now();
        let p = profile("active", Some(now + Duration::days(3)));
        assert_eq!(p.trial_status_at(now), TrialStatus::Active);
    }

    #[test]
    fn test_active_trial_past_end_is_expired() {
        let now = Utc::now();
        let p = profile("active", Some(now - Duration::seconds(1)));
        assert_eq!(p.trial_status_at(now), TrialStatus::Expired);

        let p = profile("active", None);
        assert_eq!(p.trial_status_at(now), TrialStatus::Expired);
    }

    #[test]
    fn test_not_started_is_preserved() {
        let p = profile("not_started", None);
        assert_eq!(p.trial_status_at(Utc::now()), TrialStatus::NotStarted);
    }

    #[test]
    fn test_unknown_values_decode_least_privileged() {
        assert_eq!(Role::from_db("superuser"), Role::Merchant);
        assert_eq!(TrialStatus::from_db("bogus"), TrialStatus::Expired);
        assert_eq!(SubscriptionStatus::from_db("trialing"), SubscriptionStatus::None);
    }
}
