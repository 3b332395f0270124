//! Greenbasket Core - Shared types library.
//!
//! This crate provides the domain types used across all Greenbasket
//! components:
//! - `cart` - Session cart service binary
//! - `integration-tests` - Cross-crate test suite
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for session, product, and cart identifiers
//! - [`cart`] - The cart aggregate, its line items, and the merge algorithm

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem, merge_line};
pub use types::*;
