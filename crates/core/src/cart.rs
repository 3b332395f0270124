//! The cart aggregate and its merge algorithm.
//!
//! A [`Cart`] is the full ordered set of line items persisted for one
//! session. Exactly zero or one cart exists per session at any time; it is
//! created lazily on the first successful merge and mutated only through
//! merges. The pure merge step lives here ([`merge_line`]) so every store
//! implementation applies identical semantics; locking and persistence stay
//! with the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CartId, ProductId, SessionId};

/// One product line within a cart.
///
/// Invariant: at most one `CartItem` per distinct product id within a cart.
///
/// `price_cents` is a snapshot taken when the product is first added to the
/// cart. Later merges of the same product increment the quantity but never
/// refresh the price, even when the catalog price has moved since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog product this line refers to.
    pub product_id: ProductId,
    /// Number of units, always >= 1.
    pub quantity: i64,
    /// Unit price in cents, snapshotted at first add.
    pub price_cents: i64,
}

/// The persisted line-item aggregate for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Store-assigned opaque identifier.
    pub id: CartId,
    /// External session correlation key; the sole lookup key for a cart.
    pub session_id: SessionId,
    /// Line items in insertion order. The first add of a product determines
    /// its position; later merges of the same product update in place.
    pub items: Vec<CartItem>,
    /// Commit time of the most recent successful merge.
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Quantity of a single product, or `None` if it is not in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<i64> {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
            .map(|item| item.quantity)
    }
}

/// Apply one add-or-increment merge to an item sequence.
///
/// Scans `items` for `product_id`: if found, increments that line's quantity
/// by `quantity` and leaves its price snapshot untouched (`price_cents` is
/// discarded in that case); if not found, appends a new line at the end.
///
/// Increments saturate at `i64::MAX`, so a line quantity can never wrap to
/// a smaller or negative value regardless of the requested amount.
///
/// Callers are responsible for having validated `quantity >= 1` and for
/// holding whatever exclusion the backing store requires; this function is
/// pure.
pub fn merge_line(
    items: &mut Vec<CartItem>,
    product_id: &ProductId,
    quantity: i64,
    price_cents: i64,
) {
    for item in items.iter_mut() {
        if &item.product_id == product_id {
            item.quantity = item.quantity.saturating_add(quantity);
            return;
        }
    }
    items.push(CartItem {
        product_id: product_id.clone(),
        quantity,
        price_cents,
    });
}
