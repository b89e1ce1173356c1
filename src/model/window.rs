//! Window-function rows from the builder's "cumulative" tab.
//!
//! These are carried in the request payload but not compiled into SQL, so
//! values the builder does not offer are kept rather than rejected.

use serde::{Deserialize, Serialize};

use super::null_as_empty;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WindowFunction {
    Rank,
    #[default]
    RowNumber,
    DenseRank,
    Lag,
    Lead,
    /// Not offered by the builder; kept verbatim.
    Other(String),
}

impl WindowFunction {
    pub fn name(&self) -> &str {
        match self {
            WindowFunction::Rank => "RANK",
            WindowFunction::RowNumber => "ROW_NUMBER",
            WindowFunction::DenseRank => "DENSE_RANK",
            WindowFunction::Lag => "LAG",
            WindowFunction::Lead => "LEAD",
            WindowFunction::Other(name) => name,
        }
    }
}

impl From<String> for WindowFunction {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RANK" => WindowFunction::Rank,
            "ROW_NUMBER" => WindowFunction::RowNumber,
            "DENSE_RANK" => WindowFunction::DenseRank,
            "LAG" => WindowFunction::Lag,
            "LEAD" => WindowFunction::Lead,
            _ => WindowFunction::Other(s),
        }
    }
}

impl From<WindowFunction> for String {
    fn from(f: WindowFunction) -> Self {
        f.name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
    Other(String),
}

impl SortDirection {
    pub fn name(&self) -> &str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
            SortDirection::Other(name) => name,
        }
    }
}

impl From<String> for SortDirection {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ASC" => SortDirection::Asc,
            "DESC" => SortDirection::Desc,
            _ => SortDirection::Other(s),
        }
    }
}

impl From<SortDirection> for String {
    fn from(d: SortDirection) -> Self {
        d.name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WindowFrame {
    #[default]
    UnboundedPreceding,
    UnboundedFollowing,
    Current,
    Other(String),
}

impl WindowFrame {
    pub fn name(&self) -> &str {
        match self {
            WindowFrame::UnboundedPreceding => "UNBOUNDED PRECEDING",
            WindowFrame::UnboundedFollowing => "UNBOUNDED FOLLOWING",
            WindowFrame::Current => "CURRENT",
            WindowFrame::Other(name) => name,
        }
    }
}

impl From<String> for WindowFrame {
    fn from(s: String) -> Self {
        match s.trim().to_uppercase().as_str() {
            "UNBOUNDED PRECEDING" => WindowFrame::UnboundedPreceding,
            "UNBOUNDED FOLLOWING" => WindowFrame::UnboundedFollowing,
            "CURRENT" => WindowFrame::Current,
            _ => WindowFrame::Other(s),
        }
    }
}

impl From<WindowFrame> for String {
    fn from(f: WindowFrame) -> Self {
        f.name().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alias: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub direction: SortDirection,
}

/// A windowed-function specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeRow {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub window_function: WindowFunction,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub partition_by: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub order_by: OrderBy,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub database_column: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<WindowFrame>,
}

impl Default for CumulativeRow {
    /// The row the builder adds: `ROW_NUMBER`, ascending, unbounded preceding.
    fn default() -> Self {
        Self {
            window_function: WindowFunction::RowNumber,
            partition_by: String::new(),
            order_by: OrderBy::default(),
            database_column: String::new(),
            alias: String::new(),
            frame: Some(WindowFrame::UnboundedPreceding),
        }
    }
}
