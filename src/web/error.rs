//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::BearerError;
use crate::compile::CompileError;

/// An error returned by one of the API endpoints.
///
/// Rendered as `{"error": message}` with the matching status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Unauthorized(#[from] BearerError),

    #[error("{0}")]
    Internal(&'static str),
}

pub const MISSING_PAYLOAD_FIELDS: &str = "Missing required fields in payload";
pub const MISSING_CREDENTIALS: &str = "Username and authKey are required";
pub const AUTH_FAILED: &str = "Authentication failed";
pub const MODEL_FAILED: &str = "Failed to generate SQL query";
pub const PREVIEW_FAILED: &str = "Failed to generate query";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CompileError> for ApiError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::MissingRequiredField(_) => {
                ApiError::BadRequest(MISSING_PAYLOAD_FIELDS.to_string())
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
