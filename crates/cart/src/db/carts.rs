//! Cart repository backed by `PostgreSQL` row locks.
//!
//! The merge path is a single transaction: `SELECT ... FOR UPDATE` pins the
//! session's row for the whole read-modify-write window, the new item
//! sequence is written with a `RETURNING` clause, and the response is built
//! from that returned row *inside* the transaction. There is deliberately
//! no post-commit re-read: a concurrent merge could land between commit and
//! re-read and make the response stale relative to this call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use greenbasket_core::{Cart, CartId, CartItem, ProductId, SessionId, merge_line};

use super::RepositoryError;
use crate::services::cart::CartStore;

/// Cart store implementation over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Decode one `carts` row into the domain model.
fn cart_from_row(row: &PgRow) -> Result<Cart, RepositoryError> {
    let id: CartId = row.try_get("id")?;
    let session_id: SessionId = row.try_get("session_id")?;
    let items_json: serde_json::Value = row.try_get("items")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let items: Vec<CartItem> = serde_json::from_value(items_json)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid cart items: {e}")))?;

    Ok(Cart {
        id,
        session_id,
        items,
        updated_at,
    })
}

fn items_to_json(items: &[CartItem]) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(items)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to serialize items: {e}")))
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, session_id, items, updated_at
            FROM carts
            WHERE session_id = $1
            ",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn merge(
        &self,
        session_id: &SessionId,
        product_id: &ProductId,
        quantity: i64,
        price_cents: i64,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Exclusive per-session lock for the rest of the transaction.
        // Other merges on this session queue here; merges on other sessions
        // lock different rows and proceed in parallel.
        let row = sqlx::query(
            r"
            SELECT id, session_id, items, updated_at
            FROM carts
            WHERE session_id = $1
            FOR UPDATE
            ",
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        let committed = match row {
            None => {
                let mut items = Vec::new();
                merge_line(&mut items, product_id, quantity, price_cents);

                // No row to lock yet, so two first-merges can race to this
                // insert; the unique index on session_id makes the loser
                // fail with a retryable conflict.
                let inserted = sqlx::query(
                    r"
                    INSERT INTO carts (session_id, items)
                    VALUES ($1, $2)
                    RETURNING id, session_id, items, updated_at
                    ",
                )
                .bind(session_id)
                .bind(items_to_json(&items)?)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.is_unique_violation()
                    {
                        return RepositoryError::Conflict(
                            "cart was concurrently created for session".to_owned(),
                        );
                    }
                    RepositoryError::from(e)
                })?;

                cart_from_row(&inserted)?
            }
            Some(row) => {
                let mut cart = cart_from_row(&row)?;
                merge_line(&mut cart.items, product_id, quantity, price_cents);

                let updated = sqlx::query(
                    r"
                    UPDATE carts
                    SET items = $1, updated_at = now()
                    WHERE session_id = $2
                    RETURNING id, session_id, items, updated_at
                    ",
                )
                .bind(items_to_json(&cart.items)?)
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await?;

                cart_from_row(&updated)?
            }
        };

        // Dropping tx before this point rolls everything back and releases
        // the row lock; the lock is never released mid-mutation.
        tx.commit().await?;

        Ok(committed)
    }
}
