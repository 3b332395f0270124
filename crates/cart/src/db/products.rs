//! Price resolution against the catalog's `products` table.
//!
//! The catalog service owns this table; the cart service only ever reads
//! the current unit price. Resolution runs on every merge, before any lock
//! is taken, and doubles as the existence check for the product.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use greenbasket_core::ProductId;

use super::RepositoryError;
use crate::services::cart::PriceResolver;

/// Price resolver implementation over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgPriceResolver {
    pool: PgPool,
}

impl PgPriceResolver {
    /// Create a new price resolver over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceResolver for PgPriceResolver {
    async fn lookup(&self, product_id: &ProductId) -> Result<Option<i64>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT price_cents
            FROM products
            WHERE id = $1
            ",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_get::<i64, _>("price_cents").map_err(RepositoryError::from))
            .transpose()
    }
}
