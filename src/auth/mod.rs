//! Bearer tokens for the compile endpoint.
//!
//! Tokens are opaque strings issued to any caller that presents a username
//! and key. Nothing is signed and expiry is advisory only.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Issuer reported on every token.
pub const DEFAULT_ISSUER: &str = "Job Creator API";

/// Lifetime reported on every token, in seconds.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Login request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub auth_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth_key: auth_key.into(),
        }
    }

    /// Both the username and key are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.auth_key.is_empty()
    }
}

/// Token returned by `/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: String,
    pub expires_in: u64,
    /// Unix seconds.
    pub issued_at: i64,
    pub issuer: String,
    pub token_type: String,
}

impl AuthToken {
    /// Value for an `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

/// Issue a token for `username`.
pub fn issue_token(username: &str, issuer: &str, expires_in: u64) -> AuthToken {
    let now = Utc::now();
    AuthToken {
        token: format!("mock_token_{}_{}", username, now.timestamp_millis()),
        expires_in,
        issued_at: now.timestamp(),
        issuer: issuer.to_string(),
        token_type: "Bearer".to_string(),
    }
}

/// Why an `Authorization` header was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Missing or invalid authorization header")]
    MissingOrMalformed,
    #[error("Invalid authorization token")]
    EmptyToken,
}

/// Extract the token from a `Bearer <token>` header value.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, BearerError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(BearerError::MissingOrMalformed)?;
    if token.is_empty() {
        return Err(BearerError::EmptyToken);
    }
    Ok(token)
}
