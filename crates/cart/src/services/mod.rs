//! Business logic services for the cart service.

pub mod cart;
pub mod memory;

pub use cart::{CartError, CartService, CartStore, MAX_QUANTITY, PriceResolver};
pub use memory::{MemoryCartStore, StaticPriceResolver};
