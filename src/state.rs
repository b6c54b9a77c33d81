//! Shared application state.

use std::sync::Arc;

use crate::{
    config::Config,
    crypto::{PayloadCipher, ReviewTokenSigner},
    db::DbPool,
    services::checkout_service::CheckoutClient,
    store::{PgQrStore, QrStore},
};

/// Everything a handler may need, cloned into each request.
///
/// All fields are immutable after startup; mutable state lives in Postgres.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub store: Arc<dyn QrStore>,
    pub cipher: PayloadCipher,
    pub review_tokens: ReviewTokenSigner,
    pub checkout: CheckoutClient,
    pub public_base_url: url::Url,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build production state around a connected pool.
    pub fn new(pool: DbPool, config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(PgQrStore::new(pool.clone()));
        Self::with_store(pool, store, config)
    }

    /// Build state with a custom store backend.
    pub fn with_store(
        pool: DbPool,
        store: Arc<dyn QrStore>,
        config: Config,
    ) -> anyhow::Result<Self> {
        let secret = config.payload_secret.as_bytes();
        let cipher = PayloadCipher::from_secret(secret)?;
        let review_tokens = ReviewTokenSigner::from_secret(secret)?;
        let checkout = CheckoutClient::new(&config)?;
        let public_base_url = url::Url::parse(&config.public_base_url)?;

        Ok(Self {
            pool,
            store,
            cipher,
            review_tokens,
            checkout,
            public_base_url,
            config: Arc::new(config),
        })
    }
}

