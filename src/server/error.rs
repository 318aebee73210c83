//! HTTP mapping of the crate error.
//!
//! The OAuth and auth failures keep the plain-text bodies plugin clients
//! already match on; everything else is a JSON `{"error": ...}` body.

use crate::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::AuthMissing => StatusCode::UNAUTHORIZED,
            Error::InvalidState | Error::TokenExchange(_) | Error::BadRequest(_) | Error::EmbeddingsDisabled => {
                StatusCode::BAD_REQUEST
            }
            Error::Upstream(_) | Error::UnexpectedPayload(_) | Error::VectorIndex(_) => StatusCode::BAD_GATEWAY,
            Error::Storage(_)
            | Error::Json(_)
            | Error::Io(_)
            | Error::Embedding(_)
            | Error::Parse(_)
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Error::AuthMissing | Error::InvalidState => (status, self.to_string()).into_response(),
            Error::TokenExchange(detail) => {
                tracing::warn!("Token exchange failed: {}", detail);
                (status, "Failed to get access token").into_response()
            }
            other => {
                if status.is_server_error() {
                    tracing::error!("Request failed with {}: {}", status, other);
                }
                let body = ErrorBody {
                    error: other.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
