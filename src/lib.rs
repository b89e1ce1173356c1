//! # Job Creator
//!
//! A guided wizard that builds a SELECT statement for a data warehouse.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        Wizard (client)       │  screens, form data, token, progress
//! └──────────────────────────────┘
//!          │ /auth    │ /api/model
//!          ▼          ▼
//! ┌──────────────────────────────┐
//! │          Web (server)        │  bearer check, payload checks, latency
//! └──────────────────────────────┘
//!                     │
//!                     ▼ [compile]
//! ┌──────────────────────────────┐
//! │     TokenStream → SQL text   │  dialect-aware quoting
//! └──────────────────────────────┘
//! ```
//!
//! The wizard reaches the server through a [`wizard::Backend`]; the
//! bundled [`wizard::InProcessBackend`] calls the endpoint logic directly.

pub mod auth;
pub mod compile;
pub mod config;
pub mod model;
pub mod preview;
pub mod sql;
pub mod web;
pub mod wizard;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile, CompileError, CompileOptions, CompileOutput, IdentifierPolicy};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::model::{
        AggregateFunction, AggregationRow, CumulativeRow, Field, FormData, FormUpdate,
        GeneratedQuery, QueryRequest,
    };
    pub use crate::wizard::{EntryOption, Screen, Wizard, WizardError};
}

pub use compile::{compile, CompileOptions};
pub use dialect::Dialect;
pub use model::QueryRequest;
