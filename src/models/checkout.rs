//! Checkout models for the hosted payment provider.
//!
//! The provider owns the payment page. We create a session, redirect the
//! browser, and when the browser comes back ask the provider how it ended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan offered on the pricing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Monthly,
    Yearly,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        }
    }
}

/// Outcome reported through the return URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Success,
    Cancel,
}

/// Represents a checkout session record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CheckoutSession {
    /// Session id assigned by the provider
    pub id: String,
    pub user_id: Uuid,
    pub plan: String,

    /// `pending`, `completed` or `canceled`
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /api/v1/billing/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: Plan,
}

/// Response body for `POST /api/v1/billing/checkout`.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,

    /// Hosted payment page the client should navigate to
    pub redirect_url: String,
}

/// Query string of `GET /api/v1/billing/return`.
#[derive(Debug, Deserialize)]
pub struct CheckoutReturnQuery {
    pub session_id: String,
    pub outcome: CheckoutOutcome,
}

/// Body sent to the provider's `POST /sessions`.
#[derive(Debug, Serialize)]
pub struct ProviderSessionRequest<'a> {
    pub product_id: &'a str,

    /// Our profile id, echoed back by the provider for reconciliation
    pub client_reference_id: String,

    pub success_url: String,
    pub cancel_url: String,
}

/// Provider response for a created session.
#[derive(Debug, Deserialize)]
pub struct ProviderSession {
    pub id: String,
    pub url: String,
}

/// Payment state the provider reports for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPaymentStatus {
    Paid,
    Unpaid,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Provider response for `GET /sessions/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProviderSessionStatus {
    pub id: String,

    /// Echo of the profile id we sent when creating the session
    pub client_reference_id: Option<String>,

    pub payment_status: ProviderPaymentStatus,
}
