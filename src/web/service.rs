//! Endpoint behavior, independent of the HTTP framing.
//!
//! Each function takes the raw request body so that malformed JSON is
//! reported the same way whether it arrives over HTTP or from the
//! in-process wizard backend.

use std::ops::Range;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{
    ApiError, AUTH_FAILED, MISSING_CREDENTIALS, MISSING_PAYLOAD_FIELDS, MODEL_FAILED,
    PREVIEW_FAILED,
};
use crate::auth::{issue_token, parse_bearer, AuthToken, Credentials};
use crate::compile::{compile, precheck, CompileOutput};
use crate::config::Settings;
use crate::model::QueryRequest;
use crate::preview::preview_sql;

/// Body of a successful `/api/generate-query` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub success: bool,
    pub sql_query: String,
    pub timestamp: String,
}

/// Sleep for a duration drawn uniformly from `range_ms`.
async fn simulate_latency(range_ms: Range<u64>) {
    let millis = if range_ms.is_empty() {
        range_ms.start
    } else {
        rand::rng().random_range(range_ms)
    };
    if millis > 0 {
        debug!(millis, "simulating latency");
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// `POST /auth`
pub async fn authenticate(settings: &Settings, body: &[u8]) -> Result<AuthToken, ApiError> {
    let credentials: Credentials = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "unreadable auth request");
        ApiError::Internal(AUTH_FAILED)
    })?;
    if !credentials.is_complete() {
        return Err(ApiError::BadRequest(MISSING_CREDENTIALS.to_string()));
    }

    tokio::time::sleep(settings.delays.auth()).await;

    let token = issue_token(
        &credentials.username,
        &settings.auth.issuer,
        settings.auth.expires_in,
    );
    info!(username = %credentials.username, "issued token");
    Ok(token)
}

/// `POST /api/model`
///
/// The bearer header is checked before the body is read.
pub async fn generate_model(
    settings: &Settings,
    authorization: Option<&str>,
    body: &[u8],
) -> Result<CompileOutput, ApiError> {
    parse_bearer(authorization)?;

    let request: QueryRequest = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "unreadable model request");
        ApiError::Internal(MODEL_FAILED)
    })?;
    if request.table().is_none() || request.database().is_none() {
        return Err(ApiError::BadRequest(MISSING_PAYLOAD_FIELDS.to_string()));
    }
    precheck(&request).map_err(|e| {
        warn!(error = %e, "rejected model request");
        ApiError::from(e)
    })?;

    simulate_latency(settings.delays.generate()).await;

    let output = compile(&request, &settings.compiler.options()).map_err(|e| {
        warn!(error = %e, "compile failed");
        ApiError::from(e)
    })?;
    info!(dialect = %output.dialect, source = ?output.source, "generated SQL");
    Ok(output)
}

/// `POST /api/generate-query`
pub async fn generate_preview(settings: &Settings, body: &[u8]) -> Result<PreviewResponse, ApiError> {
    let request: QueryRequest = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "unreadable preview request");
        ApiError::Internal(PREVIEW_FAILED)
    })?;

    let sql_query = preview_sql(&request);
    simulate_latency(settings.delays.preview()).await;

    Ok(PreviewResponse {
        success: true,
        sql_query,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
