//! Integration tests for Greenbasket.
//!
//! The suites run against the in-memory store wiring, which implements the
//! same locking contract as the `PostgreSQL` store, so the concurrency and
//! HTTP tests need no external services.
//!
//! # Test Categories
//!
//! - `cart_properties` - Cart engine semantics and concurrency guarantees
//! - `http_api` - Router-level tests via `tower::ServiceExt::oneshot`

use std::sync::Arc;

use greenbasket_cart::services::{
    CartService, MemoryCartStore, PriceResolver, StaticPriceResolver,
};
use greenbasket_cart::state::AppState;
use greenbasket_core::ProductId;

fn catalog(prices: impl IntoIterator<Item = (&'static str, i64)>) -> Arc<StaticPriceResolver> {
    Arc::new(StaticPriceResolver::new(prices.into_iter().map(
        |(id, cents)| {
            (
                ProductId::parse(id).expect("test product id must be valid"),
                cents,
            )
        },
    )))
}

/// A cart engine over a fresh in-memory store and the given catalog.
///
/// Returns the resolver handle as well so tests can reprice or delist
/// products mid-scenario.
#[must_use]
pub fn memory_service(
    prices: impl IntoIterator<Item = (&'static str, i64)>,
) -> (CartService, Arc<StaticPriceResolver>) {
    let resolver = catalog(prices);
    // Coerce to the trait object here; `Arc::clone` at the call site would
    // infer `Arc<dyn PriceResolver>` for its argument and fail to unify.
    let service_resolver: Arc<dyn PriceResolver> = resolver.clone();
    let service = CartService::new(Arc::new(MemoryCartStore::new()), service_resolver);
    (service, resolver)
}

/// Application state over a fresh in-memory store and the given catalog.
#[must_use]
pub fn memory_state(prices: impl IntoIterator<Item = (&'static str, i64)>) -> AppState {
    AppState::with_store(Arc::new(MemoryCartStore::new()), catalog(prices))
}
