//! HTTP route handlers for the cart service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /healthz        - Liveness (status, uptime, version)
//! GET  /healthz/ready  - Readiness (database connectivity)
//!
//! # Cart (keyed by the x-session-id header)
//! GET  /api/v1/cart    - Fetch the session's cart
//! POST /api/v1/cart    - Merge one product into the session's cart
//! ```

pub mod cart;
pub mod health;

use axum::{
    Router,
    routing::get,
};

use crate::state::AppState;

/// Create the cart API router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(cart::fetch).post(cart::add))
}

/// Create the full service router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/healthz/ready", get(health::readiness))
        .nest("/api/v1/cart", cart_routes())
}
