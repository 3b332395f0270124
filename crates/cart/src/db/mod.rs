//! Database operations for the cart service `PostgreSQL`.
//!
//! # Database: `greenbasket`
//!
//! ## Tables
//!
//! - `carts` - One row per session: jsonb item sequence plus `updated_at`
//! - `products` - Catalog rows read for price resolution (owned by the
//!   catalog service; this service only reads `price_cents`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/cart/migrations/` and run via
//! `sqlx migrate run` against the service database.

pub mod carts;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::PgCartStore;
pub use products::PgPriceResolver;

/// `PostgreSQL` error code for `lock_not_available` (raised under
/// `lock_timeout` while waiting on a `FOR UPDATE` row).
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate session cart).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store could not be reached or a lock could not be acquired in
    /// the caller's allotted time. Retryable; the store never retries
    /// internally.
    #[error("store unavailable")]
    Unavailable,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => Self::Unavailable,
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(PG_LOCK_NOT_AVAILABLE) =>
            {
                Self::Unavailable
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
