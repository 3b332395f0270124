//! Cart route handlers.
//!
//! Both operations are keyed by the `x-session-id` header, an opaque
//! correlation value issued by an external identity collaborator. Requests
//! without it are rejected before any other work.

use axum::{
    Json,
    extract::{FromRequestParts, State, rejection::JsonRejection},
    http::request::Parts,
};
use serde::Deserialize;
use tracing::instrument;

use greenbasket_core::{Cart, ProductId, SessionId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Header carrying the session correlation value.
pub const SESSION_HEADER: &str = "x-session-id";

/// Extractor for the session correlation key.
#[derive(Debug, Clone)]
pub struct SessionKey(pub SessionId);

impl<S: Send + Sync> FromRequestParts<S> for SessionKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let value = parts
            .headers
            .get(SESSION_HEADER)
            .ok_or_else(|| AppError::BadRequest(format!("Missing {SESSION_HEADER} header")))?
            .to_str()
            .map_err(|_| AppError::BadRequest(format!("Invalid {SESSION_HEADER} header")))?;

        let session_id = SessionId::parse(value)
            .map_err(|e| AppError::BadRequest(format!("Invalid {SESSION_HEADER} header: {e}")))?;

        Ok(Self(session_id))
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Fetch the session's cart.
///
/// Committed read, no locking; 404 if the session has no cart yet.
#[instrument(skip(state))]
pub async fn fetch(
    State(state): State<AppState>,
    SessionKey(session_id): SessionKey,
) -> Result<Json<Cart>> {
    let cart = state.carts().fetch(&session_id).await?;
    Ok(Json(cart))
}

/// Merge one product into the session's cart.
///
/// Returns the full post-merge cart exactly as committed by this request.
/// Malformed bodies are client errors like any other invalid input, so the
/// extractor's rejection is folded into the usual 400 shape.
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    SessionKey(session_id): SessionKey,
    body: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<Cart>> {
    let Json(body) =
        body.map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;

    let product_id = ProductId::parse(&body.product_id)
        .map_err(|e| AppError::BadRequest(format!("Invalid product_id: {e}")))?;

    let cart = state
        .carts()
        .merge(&session_id, &product_id, body.quantity)
        .await?;

    Ok(Json(cart))
}
