//! Checkout service - hosted payment provider integration.
//!
//! # Flow
//!
//! 1. `start_checkout` asks the provider for a session and stores it as `pending`
//! 2. The client redirects the browser to the returned payment page
//! 3. The provider sends the browser back to the dashboard with the session id
//! 4. `complete_checkout` asks the provider for the session's payment status,
//!    resolves the pending session and, if paid, activates the subscription
//!
//! The `outcome` in the return URL is browser-controlled and never grants a
//! subscription on its own.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::checkout::{
        CheckoutOutcome, CheckoutResponse, CheckoutSession, Plan, ProviderPaymentStatus,
        ProviderSession, ProviderSessionRequest, ProviderSessionStatus,
    },
};

/// Placeholder the provider substitutes with the session id in return URLs.
const SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// HTTP client for the hosted checkout provider.
#[derive(Clone)]
pub struct CheckoutClient {
    http: reqwest::Client,
    sessions_url: String,
    api_key: String,
    product_monthly: String,
    product_yearly: String,
    return_base: String,
}

impl CheckoutClient {
    /// Build a client with a 10 second request timeout.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            sessions_url: format!("{}/sessions", config.checkout_api_url.trim_end_matches('/')),
            api_key: config.checkout_api_key.clone(),
            product_monthly: config.checkout_product_monthly.clone(),
            product_yearly: config.checkout_product_yearly.clone(),
            return_base: format!(
                "{}/dashboard/billing",
                config.public_base_url.trim_end_matches('/')
            ),
        })
    }

    /// Provider product id for a plan.
    pub fn product_for(&self, plan: Plan) -> &str {
        match plan {
            Plan::Monthly => &self.product_monthly,
            Plan::Yearly => &self.product_yearly,
        }
    }

    /// Provider URL of a single session.
    fn session_url(&self, session_id: &str) -> Result<String, AppError> {
        let mut url = url::Url::parse(&self.sessions_url)
            .map_err(|e| AppError::CheckoutProvider(format!("Invalid sessions URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::CheckoutProvider("Sessions URL cannot be a base".to_string()))?
            .push(session_id);
        Ok(url.into())
    }

    /// Browser return URL for an outcome.
    fn return_url(&self, outcome: &str) -> String {
        format!(
            "{}?outcome={}&session_id={}",
            self.return_base, outcome, SESSION_PLACEHOLDER
        )
    }

    /// Body of a session request for `plan` on behalf of `user_id`.
    fn session_request(&self, plan: Plan, user_id: Uuid) -> ProviderSessionRequest<'_> {
        ProviderSessionRequest {
            product_id: self.product_for(plan),
            client_reference_id: user_id.to_string(),
            success_url: self.return_url("success"),
            cancel_url: self.return_url("cancel"),
        }
    }

    /// Create a hosted checkout session.
    ///
    /// # Headers Sent
    ///
    /// - `Authorization: Bearer <CHECKOUT_API_KEY>`
    /// - `Content-Type: application/json`
    ///
    /// # Errors
    ///
    /// `CheckoutProvider` on transport failure, non-2xx status or an
    /// unparseable body.
    pub async fn create_session(
        &self,
        plan: Plan,
        user_id: Uuid,
    ) -> Result<ProviderSession, AppError> {
        let response = self
            .http
            .post(&self.sessions_url)
            .bearer_auth(&self.api_key)
            .json(&self.session_request(plan, user_id))
            .send()
            .await
            .map_err(|e| AppError::CheckoutProvider(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CheckoutProvider(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        response
            .json::<ProviderSession>()
            .await
            .map_err(|e| AppError::CheckoutProvider(format!("Invalid response: {}", e)))
    }

    /// Fetch a session's payment status from the provider.
    ///
    /// # Errors
    ///
    /// `CheckoutProvider` on transport failure, non-2xx status, an
    /// unparseable body or a body describing a different session.
    pub async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<ProviderSessionStatus, AppError> {
        let response = self
            .http
            .get(self.session_url(session_id)?)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::CheckoutProvider(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CheckoutProvider(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        let session = response
            .json::<ProviderSessionStatus>()
            .await
            .map_err(|e| AppError::CheckoutProvider(format!("Invalid response: {}", e)))?;

        if session.id != session_id {
            return Err(AppError::CheckoutProvider(format!(
                "Asked for session {} but got {}",
                session_id, session.id
            )));
        }

        Ok(session)
    }
}

/// Final status for a pending session, or `None` to leave it pending.
///
/// Only the provider's payment status can complete a session. A browser
/// `cancel` may close an unpaid session, since that grants nothing.
fn resolve_status(
    outcome: CheckoutOutcome,
    payment: ProviderPaymentStatus,
) -> Option<&'static str> {
    match (payment, outcome) {
        (ProviderPaymentStatus::Paid, _) => Some("completed"),
        (ProviderPaymentStatus::Canceled, _) => Some("canceled"),
        (_, CheckoutOutcome::Cancel) => Some("canceled"),
        (_, CheckoutOutcome::Success) => None,
    }
}

/// Start a checkout for `plan` and record the pending session.
pub async fn start_checkout(
    pool: &DbPool,
    client: &CheckoutClient,
    user_id: Uuid,
    plan: Plan,
) -> Result<CheckoutResponse, AppError> {
    let session = client.create_session(plan, user_id).await?;

    sqlx::query(
        r#"
        INSERT INTO checkout_sessions (id, user_id, plan, status)
        VALUES ($1, $2, $3, 'pending')
        "#,
    )
    .bind(&session.id)
    .bind(user_id)
    .bind(plan.as_str())
    .execute(pool)
    .await?;

    tracing::info!(user_id = %user_id, session_id = %session.id, plan = plan.as_str(), "Checkout started");

    Ok(CheckoutResponse {
        session_id: session.id,
        redirect_url: session.url,
    })
}

/// Resolve a pending checkout session returned through the browser.
///
/// # Process
///
/// 1. Check the caller owns a `pending` session with this id
/// 2. Ask the provider for its payment status
/// 3. Move the session to `completed` (paid) or `canceled`, and on
///    completion set the profile's subscription to `active`
///
/// Step 3 happens in one database transaction, conditional on the session
/// still being `pending`.
///
/// # Errors
///
/// - `CheckoutSessionNotFound`: unknown, foreign or already resolved session
/// - `PaymentNotConfirmed`: browser reported success but the provider has
///   not; the session stays pending
/// - `CheckoutProvider`: provider unreachable or inconsistent
pub async fn complete_checkout(
    pool: &DbPool,
    client: &CheckoutClient,
    user_id: Uuid,
    session_id: &str,
    outcome: CheckoutOutcome,
) -> Result<CheckoutSession, AppError> {
    let pending: Option<String> = sqlx::query_scalar(
        "SELECT id FROM checkout_sessions WHERE id = $1 AND user_id = $2 AND status = 'pending'",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if pending.is_none() {
        return Err(AppError::CheckoutSessionNotFound);
    }

    let provider = client.retrieve_session(session_id).await?;

    if let Some(reference) = provider.client_reference_id.as_deref() {
        if reference != user_id.to_string() {
            tracing::warn!(user_id = %user_id, session_id = %session_id, reference, "Checkout session belongs to another profile");
            return Err(AppError::CheckoutSessionNotFound);
        }
    }

    let Some(status) = resolve_status(outcome, provider.payment_status) else {
        tracing::warn!(
            user_id = %user_id,
            session_id = %session_id,
            payment_status = ?provider.payment_status,
            "Checkout returned as success without confirmed payment"
        );
        return Err(AppError::PaymentNotConfirmed);
    };

    let mut tx = pool.begin().await?;

    let session = sqlx::query_as::<_, CheckoutSession>(
        r#"
        UPDATE checkout_sessions
        SET status = $3,
            resolved_at = $4
        WHERE id = $1 AND user_id = $2 AND status = 'pending'
        RETURNING id, user_id, plan, status, created_at, resolved_at
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind(status)
    .bind(Utc::now())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(session) = session else {
        tx.rollback().await?;
        return Err(AppError::CheckoutSessionNotFound);
    };

    if status == "completed" {
        sqlx::query(
            "UPDATE profiles SET subscription_status = 'active', updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(user_id = %user_id, session_id = %session_id, status, "Checkout resolved");

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_plan_maps_to_configured_product() {
        let client = CheckoutClient::new(&test_config()).expect("client");
        assert_eq!(client.product_for(Plan::Monthly), "prod_monthly");
        assert_eq!(client.product_for(Plan::Yearly), "prod_yearly");
    }

    #[test]
    fn test_session_request_body() {
        let client = CheckoutClient::new(&test_config()).expect("client");
        let user_id = Uuid::new_v4();
        let body = serde_json::to_value(client.session_request(Plan::Yearly, user_id))
            .expect("serialize");

        assert_eq!(body["product_id"], "prod_yearly");
        assert_eq!(body["client_reference_id"], user_id.to_string());
        assert_eq!(
            body["success_url"],
            "https://verify.example.com/dashboard/billing?outcome=success&session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(
            body["cancel_url"],
            "https://verify.example.com/dashboard/billing?outcome=cancel&session_id={CHECKOUT_SESSION_ID}"
        );
    }

    #[test]
    fn test_sessions_url_trims_slash() {
        let config = Config {
            checkout_api_url: "https://checkout.example.com/v1/".to_string(),
            ..test_config()
        };
        let client = CheckoutClient::new(&config).expect("client");
        assert_eq!(client.sessions_url, "https://checkout.example.com/v1/sessions");
    }

    #[test]
    fn test_session_url_escapes_id() {
        let client = CheckoutClient::new(&test_config()).expect("client");
        assert_eq!(
            client.session_url("cs_123").expect("url"),
            "https://checkout.example.com/v1/sessions/cs_123"
        );
        assert_eq!(
            client.session_url("cs/123").expect("url"),
            "https://checkout.example.com/v1/sessions/cs%2F123"
        );
    }

    #[test]
    fn test_only_provider_payment_completes() {
        use CheckoutOutcome::{Cancel, Success};
        use ProviderPaymentStatus::{Canceled, Paid, Unknown, Unpaid};

        assert_eq!(resolve_status(Success, Paid), Some("completed"));
        assert_eq!(resolve_status(Cancel, Paid), Some("completed"));
        assert_eq!(resolve_status(Success, Unpaid), None);
        assert_eq!(resolve_status(Success, Unknown), None);
        assert_eq!(resolve_status(Success, Canceled), Some("canceled"));
        assert_eq!(resolve_status(Cancel, Unpaid), Some("canceled"));
    }

    #[test]
    fn test_unknown_payment_status_parses() {
        let session: ProviderSessionStatus = serde_json::from_value(serde_json::json!({
            "id": "cs_1",
            "payment_status": "processing"
        }))
        .expect("parse");
        assert_eq!(session.payment_status, ProviderPaymentStatus::Unknown);
        assert!(session.client_reference_id.is_none());
    }

    /// Serves `GET /sessions/{id}` with a fixed body and returns the API base URL.
    async fn provider_stub(body: serde_json::Value) -> String {
        use axum::{Json, Router, routing::get};

        let router = Router::new().route(
            "/sessions/{id}",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_retrieve_session_reads_provider() {
        let api_url = provider_stub(serde_json::json!({
            "id": "cs_paid",
            "client_reference_id": "abc",
            "payment_status": "paid"
        }))
        .await;
        let client = CheckoutClient::new(&Config {
            checkout_api_url: api_url,
            ..test_config()
        })
        .expect("client");

        let session = client.retrieve_session("cs_paid").await.expect("session");
        assert_eq!(session.payment_status, ProviderPaymentStatus::Paid);
        assert_eq!(session.client_reference_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_retrieve_session_rejects_other_id() {
        let api_url = provider_stub(serde_json::json!({
            "id": "cs_other",
            "payment_status": "paid"
        }))
        .await;
        let client = CheckoutClient::new(&Config {
            checkout_api_url: api_url,
            ..test_config()
        })
        .expect("client");

        let err = client.retrieve_session("cs_mine").await.unwrap_err();
        assert!(matches!(err, AppError::CheckoutProvider(_)));
    }

    async fn pending_session(pool: &sqlx::PgPool, session_id: &str) -> Uuid {
        let user_id = crate::db::seed_profile(pool, "merchant").await;
        sqlx::query("INSERT INTO checkout_sessions (id, user_id, plan) VALUES ($1, $2, 'monthly')")
            .bind(session_id)
            .bind(user_id)
            .execute(pool)
            .await
            .expect("seed session");
        user_id
    }

    async fn subscription_of(pool: &sqlx::PgPool, user_id: Uuid) -> String {
        sqlx::query_scalar("SELECT subscription_status FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("profile")
    }

    async fn client_for(payment_status: &str) -> CheckoutClient {
        let api_url = provider_stub(serde_json::json!({
            "id": "cs_1",
            "payment_status": payment_status
        }))
        .await;
        CheckoutClient::new(&Config {
            checkout_api_url: api_url,
            ..test_config()
        })
        .expect("client")
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_success_return_without_payment_stays_pending(pool: sqlx::PgPool) {
        let user_id = pending_session(&pool, "cs_1").await;
        let client = client_for("unpaid").await;

        let result =
            complete_checkout(&pool, &client, user_id, "cs_1", CheckoutOutcome::Success).await;
        assert!(matches!(result, Err(AppError::PaymentNotConfirmed)));

        let status: String =
            sqlx::query_scalar("SELECT status FROM checkout_sessions WHERE id = 'cs_1'")
                .fetch_one(&pool)
                .await
                .expect("session");
        assert_eq!(status, "pending");
        assert_eq!(subscription_of(&pool, user_id).await, "none");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_paid_session_activates_once(pool: sqlx::PgPool) {
        let user_id = pending_session(&pool, "cs_1").await;
        let client = client_for("paid").await;

        let session = complete_checkout(&pool, &client, user_id, "cs_1", CheckoutOutcome::Success)
            .await
            .expect("complete");
        assert_eq!(session.status, "completed");
        assert!(session.resolved_at.is_some());
        assert_eq!(subscription_of(&pool, user_id).await, "active");

        let again =
            complete_checkout(&pool, &client, user_id, "cs_1", CheckoutOutcome::Success).await;
        assert!(matches!(again, Err(AppError::CheckoutSessionNotFound)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_foreign_session_is_not_found(pool: sqlx::PgPool) {
        pending_session(&pool, "cs_1").await;
        let stranger = crate::db::seed_profile(&pool, "merchant").await;
        let client = client_for("paid").await;

        let result =
            complete_checkout(&pool, &client, stranger, "cs_1", CheckoutOutcome::Success).await;
        assert!(matches!(result, Err(AppError::CheckoutSessionNotFound)));
        assert_eq!(subscription_of(&pool, stranger).await, "none");
    }
}
