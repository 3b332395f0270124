//! In-process store and resolver for single-node deployments and tests.
//!
//! [`MemoryCartStore`] implements the same locking contract as the
//! `PostgreSQL` store, but with an in-process mapping from session id to a
//! per-key exclusion primitive instead of row locks. Suitable when the
//! service runs as a single process; multi-node deployments need the
//! `PostgreSQL` store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use greenbasket_core::{Cart, CartId, ProductId, SessionId, merge_line};

use crate::db::RepositoryError;
use crate::services::cart::{CartStore, PriceResolver};

/// In-memory cart store with per-session exclusive locks.
///
/// Committed carts live in one map guarded by an `RwLock`; fetches only
/// ever see fully committed values because a merge publishes its result in
/// a single map write. The per-session `Mutex` map serializes merges on the
/// same session while leaving merges on distinct sessions fully parallel.
#[derive(Default)]
pub struct MemoryCartStore {
    // Lock entries are created on first use and never removed; the map only
    // grows with distinct sessions, like the carts themselves.
    locks: StdMutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    carts: RwLock<HashMap<SessionId, Cart>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn session_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.read().await.get(session_id).cloned())
    }

    async fn merge(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: i64,
        price_cents: i64,
    ) -> Result<Cart, RepositoryError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        // Read the committed cart, apply the merge off to the side, then
        // publish in a single map write. Cancellation anywhere before that
        // write leaves the committed state untouched.
        let mut cart = match self.carts.read().await.get(session_id) {
            Some(existing) => existing.clone(),
            None => Cart {
                id: CartId::generate(),
                session_id: session_id.clone(),
                items: Vec::new(),
                updated_at: Utc::now(),
            },
        };

        merge_line(&mut cart.items, product_id, quantity, price_cents);
        cart.updated_at = Utc::now();

        self.carts
            .write()
            .await
            .insert(session_id.clone(), cart.clone());

        // Return the value just committed, not a re-read: a concurrent
        // merge may already have overtaken the map by the time we return.
        Ok(cart)
    }
}

/// Fixed-map price resolver for the in-memory deployment and tests.
pub struct StaticPriceResolver {
    prices: RwLock<HashMap<ProductId, i64>>,
}

impl StaticPriceResolver {
    /// Create a resolver over the given product prices.
    #[must_use]
    pub fn new(prices: impl IntoIterator<Item = (ProductId, i64)>) -> Self {
        Self {
            prices: RwLock::new(prices.into_iter().collect()),
        }
    }

    /// Insert or replace a product's price.
    pub async fn set_price(&self, product_id: ProductId, price_cents: i64) {
        self.prices.write().await.insert(product_id, price_cents);
    }

    /// Remove a product from the catalog.
    pub async fn remove(&self, product_id: &ProductId) {
        self.prices.write().await.remove(product_id);
    }
}

#[async_trait]
impl PriceResolver for StaticPriceResolver {
    async fn lookup(&self, product_id: &ProductId) -> Result<Option<i64>, RepositoryError> {
        Ok(self.prices.read().await.get(product_id).copied())
    }
}
