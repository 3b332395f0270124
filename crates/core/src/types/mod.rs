//! Core types for Greenbasket.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod key;

pub use id::CartId;
pub use key::{KeyError, ProductId, SessionId};
