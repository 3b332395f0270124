//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`. Error bodies are JSON of the form
//! `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::CartError;

/// Application-level error type for the cart service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart engine operation failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Bad request from client (missing session header, malformed body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                CartError::ProductNotFound(_) | CartError::NotFound => StatusCode::NOT_FOUND,
                CartError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                CartError::Store(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                CartError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leak here.
    fn message(&self) -> String {
        match self {
            Self::Cart(err) => match err {
                CartError::InvalidQuantity(_) => err.to_string(),
                CartError::ProductNotFound(_) => "Product not found".to_string(),
                CartError::NotFound => "Cart not found".to_string(),
                CartError::Unavailable => "Service unavailable, retry later".to_string(),
                CartError::Store(RepositoryError::Conflict(_)) => {
                    "Cart was modified concurrently, retry".to_string()
                }
                CartError::Store(_) => "Internal server error".to_string(),
            },
            Self::BadRequest(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(serde_json::json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
