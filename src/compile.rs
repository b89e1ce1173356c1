//! Compilation from a structured query request to SQL.
//!
//! ```text
//! QueryRequest → presence checks → custom SQL override? → SELECT list → SQL
//! ```
//!
//! # Example
//!
//! ```
//! use job_creator::compile::{compile, CompileOptions};
//! use job_creator::model::{Field, QueryRequest};
//!
//! let request = QueryRequest::new("bigquery", "users")
//!     .field(Field::new("id"))
//!     .field(Field::aliased("name", "full_name"));
//!
//! let output = compile(&request, &CompileOptions::default()).unwrap();
//! assert_eq!(output.sql, "SELECT id, name AS full_name FROM users");
//! ```
//!
//! # Identifier policy
//!
//! Under [`IdentifierPolicy::Passthrough`] (the default) table, column and
//! alias names are interpolated exactly as given, so the output is only as
//! safe as the input. [`IdentifierPolicy::Strict`] validates every
//! identifier, rejects unknown aggregate functions and parses the result
//! with sqlparser before returning it.

use std::sync::{LazyLock, Once};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::parser::Parser;
use tracing::{debug, warn};

use crate::model::{AggregateFunction, AggregationRow, Field, QueryRequest};
use crate::sql::token::{Token, TokenStream};
use crate::sql::{Dialect, UnknownDialect};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error(transparent)]
    UnsupportedDatabase(#[from] UnknownDialect),

    #[error("Invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Unknown aggregate function: {0}")]
    UnknownAggregate(String),

    #[error("Invalid SQL: {0}")]
    InvalidSql(String),
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Options
// ============================================================================

/// How user-supplied identifiers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierPolicy {
    /// Interpolate identifiers verbatim.
    #[default]
    Passthrough,
    /// Validate identifiers and parse the generated SQL.
    Strict,
}

/// Options for compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub identifier_policy: IdentifierPolicy,
}

impl CompileOptions {
    pub fn with_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn strict() -> Self {
        Self::default().with_policy(IdentifierPolicy::Strict)
    }

    fn is_strict(&self) -> bool {
        self.identifier_policy == IdentifierPolicy::Strict
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Where the returned SQL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlSource {
    /// The request's custom SQL, returned verbatim.
    Custom,
    /// Assembled from the field and aggregation lists.
    Structured,
}

/// Result of compiling a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub sql: String,
    pub dialect: Dialect,
    pub source: SqlSource,
}

// ============================================================================
// Compilation
// ============================================================================

static UNVALIDATED_WARNING: Once = Once::new();

/// The checks [`compile`] runs before building anything: table name,
/// database, a known dialect, and at least one field unless custom SQL is
/// given.
pub fn precheck(request: &QueryRequest) -> CompileResult<Dialect> {
    request
        .table()
        .ok_or(CompileError::MissingRequiredField("tableName"))?;
    let database = request
        .database()
        .ok_or(CompileError::MissingRequiredField("database"))?;
    let dialect: Dialect = database.parse()?;

    if request.custom().is_none() && request.fields.is_empty() {
        return Err(CompileError::MissingRequiredField("fields"));
    }
    Ok(dialect)
}

/// Compile a request to a SELECT statement.
///
/// Runs [`precheck`] first. A non-empty custom SQL override is returned
/// as-is; otherwise the plain fields are listed first, followed by the
/// aggregations, both in input order. Window (cumulative) rows are accepted
/// and ignored.
pub fn compile(request: &QueryRequest, options: &CompileOptions) -> CompileResult<CompileOutput> {
    let dialect = precheck(request)?;
    let table = request.table().unwrap_or_default();

    if let Some(custom) = request.custom() {
        if options.is_strict() {
            validate_statement(custom, dialect)?;
        }
        debug!(%dialect, "returning custom SQL override");
        return Ok(CompileOutput {
            sql: custom.to_string(),
            dialect,
            source: SqlSource::Custom,
        });
    }

    if !request.cumulative.is_empty() {
        debug!(
            rows = request.cumulative.len(),
            "window specifications are not compiled"
        );
    }

    if options.is_strict() {
        validate_identifiers(table, &request.fields, &request.aggregation)?;
    } else {
        UNVALIDATED_WARNING.call_once(|| {
            warn!("identifier policy is passthrough: table, column and alias names are not validated");
        });
    }

    let mut items: Vec<TokenStream> = request.fields.iter().map(field_item).collect();
    for row in &request.aggregation {
        items.push(aggregate_item(row, options)?);
    }

    let mut ts = TokenStream::new();
    ts.push(Token::Select)
        .space()
        .join_comma(&items)
        .space()
        .push(Token::From)
        .space()
        .push(Token::Bare(table.to_string()));

    let sql = ts.serialize(dialect);

    if options.is_strict() {
        validate_statement(&sql, dialect)?;
    }

    Ok(CompileOutput {
        sql,
        dialect,
        source: SqlSource::Structured,
    })
}

/// `column` or `column AS alias`.
fn field_item(field: &Field) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Bare(field.column.clone()));
    push_alias(&mut ts, field.alias());
    ts
}

/// `FUNCTION(column)` or `FUNCTION(column) AS alias`.
///
/// Passthrough emits the function name as received. Strict mode emits
/// `COUNT_DISTINCT` as `COUNT(DISTINCT column)` and refuses names it does
/// not know.
fn aggregate_item(row: &AggregationRow, options: &CompileOptions) -> CompileResult<TokenStream> {
    let mut ts = TokenStream::new();

    if options.is_strict() {
        match &row.function {
            AggregateFunction::Other(name) => {
                return Err(CompileError::UnknownAggregate(name.clone()));
            }
            AggregateFunction::CountDistinct => {
                ts.push(Token::FunctionName("COUNT".into()))
                    .lparen()
                    .push(Token::Distinct)
                    .space();
            }
            known => {
                ts.push(Token::FunctionName(known.name().to_string())).lparen();
            }
        }
    } else {
        ts.push(Token::Bare(row.function.name().to_string())).lparen();
    }

    ts.push(Token::Bare(row.column.clone())).rparen();
    push_alias(&mut ts, row.alias());
    Ok(ts)
}

fn push_alias(ts: &mut TokenStream, alias: Option<&str>) {
    if let Some(alias) = alias {
        ts.space()
            .push(Token::As)
            .space()
            .push(Token::Bare(alias.to_string()));
    }
}

// ============================================================================
// Strict Validation
// ============================================================================

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").unwrap());
static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)*$").unwrap()
});

fn check(pattern: &Regex, kind: &'static str, value: &str) -> CompileResult<()> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

fn validate_identifiers(
    table: &str,
    fields: &[Field],
    aggregation: &[AggregationRow],
) -> CompileResult<()> {
    check(&QUALIFIED_NAME, "table", table)?;
    for field in fields {
        check(&QUALIFIED_NAME, "column", &field.column)?;
        if let Some(alias) = field.alias() {
            check(&NAME, "alias", alias)?;
        }
    }
    for row in aggregation {
        check(&QUALIFIED_NAME, "column", &row.column)?;
        if let Some(alias) = row.alias() {
            check(&NAME, "alias", alias)?;
        }
    }
    Ok(())
}

/// Parse `sql` for the target dialect; it must be exactly one statement.
fn validate_statement(sql: &str, dialect: Dialect) -> CompileResult<()> {
    let parser_dialect = dialect.parser_dialect();
    let statements = Parser::parse_sql(&*parser_dialect, sql)
        .map_err(|e| CompileError::InvalidSql(e.to_string()))?;
    if statements.len() != 1 {
        return Err(CompileError::InvalidSql(format!(
            "expected one statement, found {}",
            statements.len()
        )));
    }
    Ok(())
}
