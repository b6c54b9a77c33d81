//! Database connection pool and migration management.
//!
//! Profiles, sessions, QR codes, reviews and checkout sessions all live in
//! PostgreSQL. Schema changes are applied at startup from `migrations/`.

use sqlx::{Pool, Postgres};

/// PostgreSQL connection pool shared by every handler.
pub type DbPool = Pool<Postgres>;

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 5;

/// Create a new PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached or refuses authentication.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so each file runs once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro embeds the migration files at compile time
    sqlx::migrate!("./migrations").run(pool).await
}

/// Pool that never connects until first used.
///
/// Router tests that exercise only the `QrStore` path need a pool value in
/// `AppState` without a running database.
#[cfg(test)]
pub(crate) fn lazy_pool() -> DbPool {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://localhost/qr_auth_test")
        .expect("lazy pool url is valid")
}

/// Insert a profile with the given role and return its id.
#[cfg(test)]
pub(crate) async fn seed_profile(pool: &DbPool, role: &str) -> uuid::Uuid {
    sqlx::query_scalar("INSERT INTO profiles (email, role) VALUES ($1, $2) RETURNING id")
        .bind(format!("{}@example.com", uuid::Uuid::new_v4()))
        .bind(role)
        .fetch_one(pool)
        .await
        .expect("seed profile")
}

/// Insert an unscanned QR code owned by `owner_id` and return its id.
#[cfg(test)]
pub(crate) async fn seed_qr_code(
    pool: &DbPool,
    owner_id: uuid::Uuid,
    is_enabled: bool,
) -> uuid::Uuid {
    sqlx::query_scalar(
        "INSERT INTO qr_codes (owner_id, is_enabled, encrypted_payload) VALUES ($1, $2, 'opaque') RETURNING id",
    )
    .bind(owner_id)
    .bind(is_enabled)
    .fetch_one(pool)
    .await
    .expect("seed qr code")
}
