//! Query-builder data model.
//!
//! These types are the wire format shared by the wizard and the server:
//! the wizard accumulates them in [`FormData`] and sends a [`QueryRequest`]
//! snapshot to the compiler. JSON field names are camelCase.

pub mod field;
pub mod form;
pub mod window;

pub use field::{AggregateFunction, AggregationRow, Field};
pub use form::{FormData, FormUpdate, GeneratedQuery, QueryRequest};
pub use window::{CumulativeRow, OrderBy, SortDirection, WindowFrame, WindowFunction};

use serde::{Deserialize, Deserializer};

/// Deserialize a value that may be `null` as its default (empty string,
/// empty list).
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
