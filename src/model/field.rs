//! Selected columns and aggregate rows.

use serde::{Deserialize, Serialize};

use super::null_as_empty;

/// A selected column with an optional display alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Physical column name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub column: String,
    /// Display alias; empty means none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alias: String,
}

impl Field {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: String::new(),
        }
    }

    pub fn aliased(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: alias.into(),
        }
    }

    /// The alias, if one was given.
    pub fn alias(&self) -> Option<&str> {
        (!self.alias.is_empty()).then_some(self.alias.as_str())
    }
}

/// SQL aggregate function offered by the builder.
///
/// Names are matched case-insensitively. Anything else is kept verbatim in
/// `Other` so it can be reproduced or rejected by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AggregateFunction {
    #[default]
    Sum,
    Avg,
    Count,
    Min,
    Max,
    CountDistinct,
    Other(String),
}

impl AggregateFunction {
    /// Name as sent on the wire.
    pub fn name(&self) -> &str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::CountDistinct => "COUNT_DISTINCT",
            AggregateFunction::Other(name) => name,
        }
    }
}

impl From<String> for AggregateFunction {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SUM" => AggregateFunction::Sum,
            "AVG" => AggregateFunction::Avg,
            "COUNT" => AggregateFunction::Count,
            "MIN" => AggregateFunction::Min,
            "MAX" => AggregateFunction::Max,
            "COUNT_DISTINCT" => AggregateFunction::CountDistinct,
            _ => AggregateFunction::Other(s),
        }
    }
}

impl From<AggregateFunction> for String {
    fn from(f: AggregateFunction) -> Self {
        f.name().to_string()
    }
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An aggregate applied to a column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRow {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub function: AggregateFunction,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub column: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alias: String,
}

impl AggregationRow {
    pub fn new(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            function,
            column: column.into(),
            alias: String::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn alias(&self) -> Option<&str> {
        (!self.alias.is_empty()).then_some(self.alias.as_str())
    }
}
