//! SQL Dialect definitions and quoting rules.
//!
//! Each target warehouse implements `SqlDialect` to describe how it quotes
//! identifiers; `Dialect::parser_dialect` maps it to the sqlparser dialect
//! used to parse emitted SQL back for validation.
//!
//! - Identifier quoting: `"` (Snowflake/PostgreSQL/Redshift), `` ` `` (BigQuery/MySQL)
//!
//! # Usage
//!
//! ```
//! use job_creator::dialect::{Dialect, SqlDialect};
//!
//! let dialect: Dialect = "snowflake".parse().unwrap();
//! assert_eq!(dialect.quote_identifier("user"), "\"user\"");
//! ```

mod bigquery;
pub mod helpers;
mod mysql;
mod postgres;
mod redshift;
mod snowflake;

pub use bigquery::BigQuery;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use redshift::Redshift;
pub use snowflake::Snowflake;

use std::str::FromStr;

use sqlparser::dialect::{
    BigQueryDialect, MySqlDialect, PostgreSqlDialect, RedshiftSqlDialect, SnowflakeDialect,
};

/// SQL dialect trait - defines how identifiers are rendered.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging (lowercase, wire form).
    fn name(&self) -> &'static str;

    /// Human-readable product name, as offered by the preview endpoint.
    fn display_name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    ///
    /// - Snowflake/PostgreSQL/Redshift: `"identifier"`
    /// - BigQuery/MySQL: `` `identifier` ``
    fn quote_identifier(&self, ident: &str) -> String;
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    BigQuery,
    Snowflake,
    Postgres,
    MySql,
    Redshift,
}

/// Error returned when a database name matches no known dialect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported database: {0}")]
pub struct UnknownDialect(pub String);

impl Dialect {
    /// All dialects, in the order the preview endpoint lists them.
    pub const ALL: [Dialect; 5] = [
        Dialect::BigQuery,
        Dialect::Snowflake,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Redshift,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::BigQuery => &BigQuery,
            Dialect::Snowflake => &Snowflake,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Redshift => &Redshift,
        }
    }

    /// The sqlparser dialect used to parse SQL emitted for this target.
    pub fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        match self {
            Dialect::BigQuery => Box::new(BigQueryDialect {}),
            Dialect::Snowflake => Box::new(SnowflakeDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::Redshift => Box::new(RedshiftSqlDialect {}),
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn display_name(&self) -> &'static str {
        self.dialect().display_name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    /// Parse a database name case-insensitively.
    ///
    /// Accepts both the wire names the wizard sends (`bigquery`) and the
    /// display names the preview endpoint uses (`PostgreSQL`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bigquery" => Ok(Dialect::BigQuery),
            "snowflake" => Ok(Dialect::Snowflake),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "redshift" => Ok(Dialect::Redshift),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
