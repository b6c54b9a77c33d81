//! HTTP router.
//!
//! # Route Groups
//!
//! - Public: health, verification, review submission
//! - Account: any authenticated user (profile, billing)
//! - Dashboard: authenticated users with an active trial, subscription or admin role

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware, state::AppState};

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let account_routes = Router::new()
        .route("/api/v1/profile", get(handlers::profile::get_profile))
        .route("/api/v1/profile/trial", post(handlers::profile::start_trial))
        .route(
            "/api/v1/profile/settings",
            patch(handlers::profile::update_settings),
        )
        .route(
            "/api/v1/billing/checkout",
            post(handlers::billing::create_checkout),
        )
        .route(
            "/api/v1/billing/return",
            get(handlers::billing::checkout_return),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let dashboard_routes = Router::new()
        .route(
            "/api/v1/qr-codes",
            post(handlers::qr_codes::create_qr_codes).get(handlers::qr_codes::list_qr_codes),
        )
        .route(
            "/api/v1/qr-codes/{id}",
            get(handlers::qr_codes::get_qr_code).patch(handlers::qr_codes::update_qr_code),
        )
        .route(
            "/api/v1/qr-codes/{id}/reviews",
            get(handlers::qr_codes::list_reviews),
        )
        // Layers run outermost-last: auth first, then the access gate
        .route_layer(axum_middleware::from_fn(
            middleware::auth::require_dashboard_access,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/verify", get(handlers::verify::verify_qr_code))
        .route(
            "/verify/{id}/reviews",
            post(handlers::verify::submit_review),
        )
        .merge(account_routes)
        .merge(dashboard_routes)
        .layer(TraceLayer::new_for_http());

    if let Some(ref origin) = state.config.cors_origin {
        let cors = CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PATCH])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app = app.layer(cors);
    }

    Ok(app.with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::test_config, db::lazy_pool, store::MemoryQrStore};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let state = AppState::with_store(lazy_pool(), Arc::new(MemoryQrStore::new()), test_config())
            .expect("state");
        build_router(state).expect("router")
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer() {
        for (method, uri) in [
            ("GET", "/api/v1/profile"),
            ("POST", "/api/v1/billing/checkout"),
            ("GET", "/api/v1/qr-codes"),
            ("PATCH", "/api/v1/qr-codes/00000000-0000-0000-0000-000000000000"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request");
            let response = router().oneshot(request).await.expect("response");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_verify_is_public() {
        let request = Request::builder()
            .uri("/verify")
            .body(Body::empty())
            .expect("request");
        let response = router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cors_origin_must_be_header_value() {
        let config = crate::config::Config {
            cors_origin: Some("https://app.example.com\n".to_string()),
            ..test_config()
        };
        let state = AppState::with_store(lazy_pool(), Arc::new(MemoryQrStore::new()), config)
            .expect("state");
        assert!(build_router(state).is_err());
    }
}
