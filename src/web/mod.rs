//! HTTP API for Job Creator
//!
//! Provides the token endpoint, the authoritative compiler endpoint and the
//! preview endpoint.

mod error;
mod server;
pub mod service;

pub use error::ApiError;
pub use server::*;
pub use service::PreviewResponse;
