//! Form state and the request payload built from it.

use serde::{Deserialize, Serialize};

use super::{null_as_empty, AggregationRow, CumulativeRow, Field};

/// Everything the user has entered in one wizard session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub database: String,
    pub table_name: String,
    pub fields: Vec<Field>,
    pub aggregation: Vec<AggregationRow>,
    pub cumulative: Vec<CumulativeRow>,
    pub custom_sql: String,
}

/// A partial update to [`FormData`]; `None` leaves the value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormUpdate {
    pub table_name: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub aggregation: Option<Vec<AggregationRow>>,
    pub cumulative: Option<Vec<CumulativeRow>>,
    pub custom_sql: Option<String>,
}

impl FormData {
    /// Merge a partial update.
    ///
    /// The database is not part of [`FormUpdate`]; it is only set by
    /// selecting a database in the wizard.
    pub fn apply(&mut self, update: FormUpdate) {
        if let Some(table_name) = update.table_name {
            self.table_name = table_name;
        }
        if let Some(fields) = update.fields {
            self.fields = fields;
        }
        if let Some(aggregation) = update.aggregation {
            self.aggregation = aggregation;
        }
        if let Some(cumulative) = update.cumulative {
            self.cumulative = cumulative;
        }
        if let Some(custom_sql) = update.custom_sql {
            self.custom_sql = custom_sql;
        }
    }

    /// Snapshot this form as a compile request.
    ///
    /// Empty aggregation and cumulative lists and empty custom SQL are left
    /// out of the payload.
    pub fn to_request(&self) -> QueryRequest {
        QueryRequest {
            database: Some(self.database.clone()),
            table_name: Some(self.table_name.clone()),
            fields: self.fields.clone(),
            aggregation: self.aggregation.clone(),
            cumulative: self.cumulative.clone(),
            custom_sql: (!self.custom_sql.is_empty()).then(|| self.custom_sql.clone()),
        }
    }
}

/// The payload accepted by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<Field>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aggregation: Vec<AggregationRow>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub cumulative: Vec<CumulativeRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_sql: Option<String>,
}

impl QueryRequest {
    /// Start a request for `table` on `database`.
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            table_name: Some(table.into()),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn aggregate(mut self, row: AggregationRow) -> Self {
        self.aggregation.push(row);
        self
    }

    pub fn custom_sql(mut self, sql: impl Into<String>) -> Self {
        self.custom_sql = Some(sql.into());
        self
    }

    /// Table name, treating an empty string as absent.
    pub fn table(&self) -> Option<&str> {
        self.table_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Database name, treating an empty string as absent.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref().filter(|s| !s.is_empty())
    }

    /// Custom SQL override, treating an empty string as absent.
    pub fn custom(&self) -> Option<&str> {
        self.custom_sql.as_deref().filter(|s| !s.is_empty())
    }
}

/// SQL returned by the compiler together with the payload that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuery {
    pub sql: String,
    pub request: QueryRequest,
}
