//! Greenbasket cart service library.
//!
//! This crate provides the session cart service as a library, allowing the
//! router and engine to be exercised by the integration test suite without
//! a running server.
//!
//! # Architecture
//!
//! - Axum for the thin HTTP transport (`routes`)
//! - The cart engine (`services::cart`) owns the merge protocol: validate,
//!   resolve price, then a locked read-modify-write against the store
//! - Two store substrates: `PostgreSQL` row locks (`db::carts`) and an
//!   in-process per-session lock map (`services::memory`)
//! - The product catalog is an external collaborator; this service only
//!   performs read-only price lookups against it

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
