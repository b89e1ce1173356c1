//! Test utilities for SQL emission validation.
//!
//! Uses sqlparser-rs for roundtrip validation of emitted SQL.

use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// ```ignore
/// use crate::sql::test_utils::validate_sql;
/// use crate::sql::dialect::Dialect;
///
/// validate_sql("SELECT id FROM users", Dialect::Snowflake).unwrap();
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect = dialect.parser_dialect();
    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("SQL validation failed for {:?}: {}\nSQL: {}", dialect, e, sql))
}

/// Asserts that SQL is valid for every supported dialect.
pub fn assert_valid_sql_all_dialects(sql_fn: impl Fn(Dialect) -> String) {
    for dialect in Dialect::ALL {
        let sql = sql_fn(dialect);
        if let Err(e) = validate_sql(&sql, dialect) {
            panic!("{}", e);
        }
    }
}
