//! HTTP middleware components.
//!
//! - `auth::auth_middleware` resolves the session into an `AuthContext`
//! - `auth::require_dashboard_access` gates dashboard routes on trial/subscription

/// Session authentication and access gating
pub mod auth;
