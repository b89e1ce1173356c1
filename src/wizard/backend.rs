//! The wizard's view of the server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{WizardError, WizardResult};
use crate::auth::{AuthToken, Credentials};
use crate::config::Settings;
use crate::model::QueryRequest;
use crate::web::service;
use crate::web::ApiError;

/// Token and compile calls made by the wizard.
///
/// Implementations map their own failures onto [`WizardError::Auth`],
/// [`WizardError::Server`] and [`WizardError::Network`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn authenticate(&self, credentials: &Credentials) -> WizardResult<AuthToken>;

    /// Compile `request` to SQL.
    async fn generate(&self, token: &AuthToken, request: &QueryRequest) -> WizardResult<String>;
}

/// Calls the endpoint logic directly, without a socket.
///
/// Requests still go through JSON so the server sees the same bytes an
/// HTTP client would send.
#[derive(Debug, Clone)]
pub struct InProcessBackend {
    settings: Arc<Settings>,
}

impl InProcessBackend {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }
}

fn api_error(err: ApiError) -> WizardError {
    match err {
        ApiError::Unauthorized(e) => WizardError::Auth(e.to_string()),
        other => WizardError::Server {
            status: other.status().as_u16(),
            message: other.to_string(),
        },
    }
}

fn encode<T: serde::Serialize>(value: &T) -> WizardResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| WizardError::Network(e.to_string()))
}

#[async_trait]
impl Backend for InProcessBackend {
    async fn authenticate(&self, credentials: &Credentials) -> WizardResult<AuthToken> {
        let body = encode(credentials)?;
        service::authenticate(&self.settings, &body)
            .await
            .map_err(|e| WizardError::Auth(e.to_string()))
    }

    async fn generate(&self, token: &AuthToken, request: &QueryRequest) -> WizardResult<String> {
        let body = encode(request)?;
        let header = token.header_value();
        service::generate_model(&self.settings, Some(&header), &body)
            .await
            .map(|output| output.sql)
            .map_err(api_error)
    }
}

/// Run `fut`, failing with a network error once `timeout` elapses.
pub(crate) async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl std::future::Future<Output = WizardResult<T>>,
) -> WizardResult<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| WizardError::Network(format!("request timed out after {:?}", limit)))?,
        None => fut.await,
    }
}
