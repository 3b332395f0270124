//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use crate::db::{PgCartStore, PgPriceResolver};
use crate::services::{CartService, CartStore, PriceResolver};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart engine and, when running against `PostgreSQL`, the connection pool
/// for readiness probes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    carts: CartService,
    pool: Option<PgPool>,
    started_at: Instant,
}

impl AppState {
    /// Wire the engine to `PostgreSQL`-backed store and resolver.
    #[must_use]
    pub fn with_postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgCartStore::new(pool.clone()));
        let resolver = Arc::new(PgPriceResolver::new(pool.clone()));
        Self::from_parts(CartService::new(store, resolver), Some(pool))
    }

    /// Wire the engine to explicit store and resolver objects.
    ///
    /// Used for the single-process in-memory deployment and by tests.
    #[must_use]
    pub fn with_store(store: Arc<dyn CartStore>, resolver: Arc<dyn PriceResolver>) -> Self {
        Self::from_parts(CartService::new(store, resolver), None)
    }

    fn from_parts(carts: CartService, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                carts,
                pool,
                started_at: Instant::now(),
            }),
        }
    }

    /// Get a reference to the cart engine.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Get a reference to the database connection pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Seconds since this process built its state.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
