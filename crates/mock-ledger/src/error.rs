//! Error type for the development ledger.
//!
//! [`MockError`] implements [`axum::response::IntoResponse`] so handlers can
//! return `Result<…, MockError>` directly. Status codes follow what the
//! wallet bridge client expects: `401`/`403` read as a user rejection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Unknown contract, or a block beyond the head.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed path segment or request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No account is granted to the caller.
    #[error("no active account")]
    NoActiveAccount,

    /// The permission request targets a network this bridge does not serve.
    #[error("permission refused: {0}")]
    PermissionRefused(String),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoActiveAccount => StatusCode::UNAUTHORIZED,
            Self::PermissionRefused(_) => StatusCode::FORBIDDEN,
        };
        let message = self.to_string();

        tracing::warn!(%status, error = %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
