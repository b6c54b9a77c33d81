//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize environment variables into a type-safe struct,
//! then validates the values that cannot be expressed through types alone.

use serde::Deserialize;

/// Minimum length of `PAYLOAD_SECRET` in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Upper bound of `REVIEW_WINDOW_MINUTES` (one week).
const MAX_REVIEW_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Upper bound of `TRIAL_DAYS`.
const MAX_TRIAL_DAYS: i64 = 365;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `PAYLOAD_SECRET` (required): master secret for payload encryption and review tokens
/// - `PUBLIC_BASE_URL` (required): base of the verification links printed into QR codes
/// - `REVIEW_WINDOW_MINUTES` (optional): review token lifetime, defaults to 30
/// - `TRIAL_DAYS` (optional): length of a merchant trial, defaults to 14
/// - `CHECKOUT_API_URL`, `CHECKOUT_API_KEY` (required): hosted checkout provider
/// - `CHECKOUT_PRODUCT_MONTHLY`, `CHECKOUT_PRODUCT_YEARLY` (required): provider product ids
/// - `CORS_ORIGIN` (optional): dashboard origin allowed by CORS
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub payload_secret: String,

    pub public_base_url: String,

    #[serde(default = "default_review_window")]
    pub review_window_minutes: i64,

    #[serde(default = "default_trial_days")]
    pub trial_days: i64,

    pub checkout_api_url: String,

    pub checkout_api_key: String,

    pub checkout_product_monthly: String,

    pub checkout_product_yearly: String,

    #[serde(default)]
    pub cors_origin: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_review_window() -> i64 {
    30
}

fn default_trial_days() -> i64 {
    14
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - A value fails validation (see [`Config::validate`])
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    /// Check invariants that deserialization cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payload_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "PAYLOAD_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        url::Url::parse(&self.public_base_url)
            .map_err(|e| ConfigError::Invalid(format!("PUBLIC_BASE_URL: {e}")))?;
        url::Url::parse(&self.checkout_api_url)
            .map_err(|e| ConfigError::Invalid(format!("CHECKOUT_API_URL: {e}")))?;

        if !(1..=MAX_REVIEW_WINDOW_MINUTES).contains(&self.review_window_minutes) {
            return Err(ConfigError::Invalid(format!(
                "REVIEW_WINDOW_MINUTES must be between 1 and {MAX_REVIEW_WINDOW_MINUTES}"
            )));
        }

        if !(1..=MAX_TRIAL_DAYS).contains(&self.trial_days) {
            return Err(ConfigError::Invalid(format!(
                "TRIAL_DAYS must be between 1 and {MAX_TRIAL_DAYS}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/qr_auth_test".to_string(),
        server_port: 3000,
        payload_secret: "0123456789abcdef0123456789abcdef".to_string(),
        public_base_url: "https://verify.example.com".to_string(),
        review_window_minutes: 30,
        trial_days: 14,
        checkout_api_url: "https://checkout.example.com/v1".to_string(),
        checkout_api_key: "sk_test".to_string(),
        checkout_product_monthly: "prod_monthly".to_string(),
        checkout_product_yearly: "prod_yearly".to_string(),
        cors_origin: None,
    }
}
