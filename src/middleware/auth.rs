//! Session authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the session token from the Authorization header
//! 2. Hash it and look up an unexpired session joined with its profile
//! 3. Inject an `AuthContext` into the request
//! 4. Reject unauthenticated requests with HTTP 401
//!
//! There is no process-wide "current user": each request carries its own
//! context, rebuilt from the database on every call.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::profile::{Profile, Role, SubscriptionStatus, TrialStatus},
    state::AppState,
};

/// Authentication context attached to authenticated requests.
///
/// Route handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,

    /// Effective at request time (an ended trial reads as `Expired`)
    pub trial_status: TrialStatus,

    pub subscription_status: SubscriptionStatus,
}

impl AuthContext {
    pub fn from_profile(profile: &Profile, now: DateTime<Utc>) -> Self {
        Self {
            user_id: profile.id,
            role: Role::from_db(&profile.role),
            trial_status: profile.trial_status_at(now),
            subscription_status: SubscriptionStatus::from_db(&profile.subscription_status),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins, paying subscribers and merchants inside their trial.
    pub fn has_dashboard_access(&self) -> bool {
        self.is_admin()
            || self.subscription_status == SubscriptionStatus::Active
            || self.trial_status == TrialStatus::Active
    }

    /// Whether this user may read or change a resource owned by `owner_id`.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query `sessions` joined with `profiles` where `expires_at > NOW()`
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::Unauthorized)?;
    let token_hash = hash_token(token);

    let profile = sqlx::query_as::<_, Profile>(
        "SELECT p.id, p.email, p.role, p.trial_status, p.trial_ends_at,
                p.subscription_status, p.enable_reviews
         FROM sessions s
         JOIN profiles p ON p.id = s.user_id
         WHERE s.token_hash = $1 AND s.expires_at > NOW()",
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    let auth_context = AuthContext::from_profile(&profile, Utc::now());
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

/// Reject authenticated users with neither an active trial nor subscription.
///
/// Must be layered inside `auth_middleware`.
pub async fn require_dashboard_access(request: Request, next: Next) -> Result<Response, AppError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .ok_or(AppError::Unauthorized)?;

    if !auth.has_dashboard_access() {
        return Err(AppError::SubscriptionRequired);
    }

    Ok(next.run(request).await)
}

/// `Bearer <token>` value of the Authorization header.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Hex SHA-256 of a session token, as stored in `sessions.token_hash`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use chrono::Duration;

    fn context(role: Role, trial: TrialStatus, sub: SubscriptionStatus) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
            trial_status: trial,
            subscription_status: sub,
        }
    }

    #[test]
    fn test_dashboard_access_matrix() {
        use SubscriptionStatus as S;
        use TrialStatus as T;

        assert!(context(Role::Admin, T::NotStarted, S::None).has_dashboard_access());
        assert!(context(Role::Merchant, T::Active, S::None).has_dashboard_access());
        assert!(context(Role::Merchant, T::Expired, S::Active).has_dashboard_access());
        assert!(!context(Role::Merchant, T::NotStarted, S::None).has_dashboard_access());
        assert!(!context(Role::Merchant, T::Expired, S::Canceled).has_dashboard_access());
    }

    #[test]
    fn test_can_manage() {
        let merchant = context(Role::Merchant, TrialStatus::Active, SubscriptionStatus::None);
        assert!(merchant.can_manage(merchant.user_id));
        assert!(!merchant.can_manage(Uuid::new_v4()));

        let admin = context(Role::Admin, TrialStatus::NotStarted, SubscriptionStatus::None);
        assert!(admin.can_manage(Uuid::new_v4()));
    }

    #[test]
    fn test_context_uses_effective_trial() {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: "shop@example.com".to_string(),
            role: "merchant".to_string(),
            trial_status: "active".to_string(),
            trial_ends_at: Some(now - Duration::hours(1)),
            subscription_status: "none".to_string(),
            enable_reviews: false,
        };

        let ctx = AuthContext::from_profile(&profile, now);
        assert_eq!(ctx.trial_status, TrialStatus::Expired);
        assert!(!ctx.has_dashboard_access());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let request = Request::builder()
            .header("Authorization", "Bearer abc123")
            .body(Body::empty())
            .expect("request");
        assert_eq!(bearer_token(&request), Some("abc123"));

        for header in ["abc123", "Bearer ", "Basic abc123"] {
            let request = Request::builder()
                .header("Authorization", header)
                .body(Body::empty())
                .expect("request");
            assert_eq!(bearer_token(&request), None);
        }
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
