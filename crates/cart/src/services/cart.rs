//! The cart engine: validation, price resolution, and the merge protocol.
//!
//! [`CartService`] owns the mutation protocol for cart records. It is
//! constructed with explicit store and resolver objects (no global database
//! handle), which is also what makes it testable with doubles.
//!
//! The ordering inside [`CartService::merge`] is deliberate: quantity
//! validation and price resolution both happen before any lock is taken, so
//! the cheap failures never enter the locked section and leave no side
//! effects behind.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use greenbasket_core::{Cart, ProductId, SessionId};

use crate::db::RepositoryError;

/// Largest quantity accepted in a single merge request.
///
/// Keeps a single request from absurdly inflating a line; increments are
/// additionally saturating at the store level, so accumulated quantities
/// can never wrap.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Errors surfaced by the cart engine.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity is zero, negative, or over the per-request
    /// ceiling. Rejected before any other work.
    #[error("quantity must be between 1 and {max}, got {0}", max = MAX_QUANTITY)]
    InvalidQuantity(i64),

    /// The price resolver has no record of the product. Rejected before
    /// the lock is taken.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// No cart exists for the session.
    #[error("cart not found")]
    NotFound,

    /// The store (or its lock) was not available within the caller's
    /// allotted time. Retryable.
    #[error("cart store unavailable")]
    Unavailable,

    /// Persistence failure while reading, writing, or committing. The
    /// store has already rolled back; the cart is unchanged.
    #[error("store error: {0}")]
    Store(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unavailable => Self::Unavailable,
            other => Self::Store(other),
        }
    }
}

/// Persistence seam for cart aggregates.
///
/// Implementations must guarantee the concurrency contract: `merge` holds
/// an exclusive lock scoped to one session for the whole read-modify-write
/// window, releases it only after commit or rollback, and returns exactly
/// the value it committed (never a fresh re-read, which could already be
/// stale relative to this call). `fetch` takes no lock and returns some
/// committed state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Committed read of the session's cart, if one exists.
    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Cart>, RepositoryError>;

    /// Locked add-or-increment of one product line.
    ///
    /// Creates the cart lazily if the session has none. `price_cents` is
    /// only used when the product is not already in the cart (snapshot
    /// pricing).
    async fn merge(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: i64,
        price_cents: i64,
    ) -> Result<Cart, RepositoryError>;
}

/// Read-only price lookup against the product catalog.
///
/// May be a remote, slow, or failing collaborator. A `None` result means
/// the catalog has no record of the product, regardless of whether it once
/// existed.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceResolver: Send + Sync {
    /// Current unit price of a product in cents, or `None` if unknown.
    async fn lookup(&self, product_id: &ProductId) -> Result<Option<i64>, RepositoryError>;
}

/// The session cart engine.
pub struct CartService {
    store: Arc<dyn CartStore>,
    resolver: Arc<dyn PriceResolver>,
}

impl CartService {
    /// Create a new cart engine over the given store and price resolver.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, resolver: Arc<dyn PriceResolver>) -> Self {
        Self { store, resolver }
    }

    /// Return the most recently committed cart for the session.
    ///
    /// Lock-free: a merge may be in flight, in which case this returns the
    /// state committed before it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the session has no cart, or a
    /// store error.
    #[tracing::instrument(skip(self), fields(session = %session_id))]
    pub async fn fetch(&self, session_id: &SessionId) -> Result<Cart, CartError> {
        match self.store.fetch(session_id).await? {
            Some(cart) => Ok(cart),
            None => Err(CartError::NotFound),
        }
    }

    /// Atomically add `quantity` units of a product to the session's cart.
    ///
    /// The price is re-resolved on every call, even when the product is
    /// already in the cart and the freshly resolved value will be discarded
    /// in favour of the snapshot. Resolving it anyway is what validates
    /// that the product still exists in the catalog.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] for quantities outside
    ///   `1..=MAX_QUANTITY`, before any other work
    /// - [`CartError::ProductNotFound`] if the resolver has no price,
    ///   before the lock is taken
    /// - [`CartError::Unavailable`] if the lock or pool timed out
    /// - [`CartError::Store`] for persistence failures (already rolled back)
    #[tracing::instrument(skip(self), fields(session = %session_id, product = %product_id))]
    pub async fn merge(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let price_cents = self
            .resolver
            .lookup(product_id)
            .await?
            .ok_or_else(|| CartError::ProductNotFound(product_id.clone()))?;

        let cart = self
            .store
            .merge(session_id, product_id, quantity, price_cents)
            .await?;

        tracing::debug!(
            cart = %cart.id,
            lines = cart.items.len(),
            total_quantity = cart.total_quantity(),
            "cart merge committed"
        );

        Ok(cart)
    }
}
