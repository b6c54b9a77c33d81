//! QR Authentication Service - Main Application Entry Point
//!
//! A REST API for issuing and verifying product-authentication QR codes.
//! Each printed code verifies exactly once; every later scan reports the
//! product as not authentic. Merchants manage their codes, reviews and
//! subscription through authenticated dashboard endpoints.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: session bearer tokens with SHA-256 hashing
//! - **Payload encryption**: AES-256-GCM-SIV with an HKDF-derived key
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load and validate configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build application state and HTTP router
//! 5. Start server on configured port

mod config;
mod crypto;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = state::AppState::new(pool, config)?;
    let app = routes::build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
