//! Integration tests for payload → SQL compilation.
//!
//! Payloads are written as JSON, the way the wizard sends them.

use insta::assert_snapshot;
use job_creator::compile::{compile, CompileError, CompileOptions, SqlSource};
use job_creator::model::QueryRequest;
use job_creator::sql::Dialect;

fn request(json: &str) -> QueryRequest {
    serde_json::from_str(json).expect("test payload should parse")
}

fn passthrough(json: &str) -> Result<String, CompileError> {
    compile(&request(json), &CompileOptions::default()).map(|o| o.sql)
}

fn strict(json: &str) -> Result<String, CompileError> {
    compile(&request(json), &CompileOptions::strict()).map(|o| o.sql)
}

// ============================================================================
// Field Lists
// ============================================================================

#[test]
fn test_fields_with_and_without_alias() {
    let sql = passthrough(
        r#"{
            "database": "bigquery",
            "tableName": "users",
            "fields": [
                {"column": "id", "alias": ""},
                {"column": "name", "alias": "full_name"}
            ]
        }"#,
    )
    .unwrap();

    assert_snapshot!(sql, @"SELECT id, name AS full_name FROM users");
}

#[test]
fn test_field_order_is_preserved() {
    let sql = passthrough(
        r#"{
            "database": "snowflake",
            "tableName": "t",
            "fields": [
                {"column": "c", "alias": ""},
                {"column": "a", "alias": ""},
                {"column": "b", "alias": ""}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(sql, "SELECT c, a, b FROM t");
}

#[test]
fn test_null_alias_is_no_alias() {
    let sql = passthrough(
        r#"{"database":"bigquery","tableName":"t","fields":[{"column":"a","alias":null}]}"#,
    )
    .unwrap();
    assert_eq!(sql, "SELECT a FROM t");
}

#[test]
fn test_identifiers_are_not_quoted() {
    let sql = passthrough(
        r#"{
            "database": "snowflake",
            "tableName": "analytics.public.Orders",
            "fields": [{"column": "Order Id", "alias": "select"}]
        }"#,
    )
    .unwrap();
    assert_eq!(sql, "SELECT Order Id AS select FROM analytics.public.Orders");
}

// ============================================================================
// Aggregations
// ============================================================================

#[test]
fn test_aggregations_after_fields() {
    let sql = passthrough(
        r#"{
            "database": "bigquery",
            "tableName": "sales",
            "fields": [{"column": "region", "alias": ""}],
            "aggregation": [
                {"function": "SUM", "column": "amount", "alias": "total"},
                {"function": "COUNT", "column": "id", "alias": ""},
                {"function": "AVG", "column": "amount", "alias": "mean"}
            ]
        }"#,
    )
    .unwrap();

    assert_snapshot!(sql, @"SELECT region, SUM(amount) AS total, COUNT(id), AVG(amount) AS mean FROM sales");
}

#[test]
fn test_lowercase_function_is_normalized() {
    let sql = passthrough(
        r#"{
            "database": "bigquery",
            "tableName": "t",
            "fields": [{"column": "a", "alias": ""}],
            "aggregation": [{"function": "max", "column": "b", "alias": ""}]
        }"#,
    )
    .unwrap();
    assert_eq!(sql, "SELECT a, MAX(b) FROM t");
}

#[test]
fn test_unknown_function_passes_through() {
    let sql = passthrough(
        r#"{
            "database": "bigquery",
            "tableName": "t",
            "fields": [{"column": "a", "alias": ""}],
            "aggregation": [{"function": "ApproxCount", "column": "b", "alias": "n"}]
        }"#,
    )
    .unwrap();
    assert_eq!(sql, "SELECT a, ApproxCount(b) AS n FROM t");
}

#[test]
fn test_cumulative_rows_are_ignored() {
    let sql = passthrough(
        r#"{
            "database": "snowflake",
            "tableName": "t",
            "fields": [{"column": "a", "alias": ""}],
            "cumulative": [{
                "windowFunction": "RANK",
                "partitionBy": "a",
                "orderBy": {"alias": "b", "direction": "DESC"},
                "databaseColumn": "b",
                "alias": "r"
            }]
        }"#,
    )
    .unwrap();
    assert_eq!(sql, "SELECT a FROM t");
}

// ============================================================================
// Custom SQL
// ============================================================================

#[test]
fn test_custom_sql_is_returned_verbatim() {
    let output = compile(
        &request(
            r#"{
                "database": "snowflake",
                "tableName": "ignored",
                "fields": [{"column": "x", "alias": ""}],
                "customSql": "  select *\nfrom real_table;  "
            }"#,
        ),
        &CompileOptions::default(),
    )
    .unwrap();

    assert_eq!(output.sql, "  select *\nfrom real_table;  ");
    assert_eq!(output.source, SqlSource::Custom);
    assert_eq!(output.dialect, Dialect::Snowflake);
}

#[test]
fn test_empty_custom_sql_is_ignored() {
    let sql = passthrough(
        r#"{
            "database": "bigquery",
            "tableName": "t",
            "fields": [{"column": "a", "alias": ""}],
            "customSql": ""
        }"#,
    )
    .unwrap();
    assert_eq!(sql, "SELECT a FROM t");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_table_name() {
    let err = passthrough(r#"{"database":"bigquery","fields":[{"column":"a"}]}"#).unwrap_err();
    assert_eq!(err, CompileError::MissingRequiredField("tableName"));
}

#[test]
fn test_missing_database() {
    let err = passthrough(r#"{"tableName":"t","fields":[{"column":"a"}]}"#).unwrap_err();
    assert_eq!(err, CompileError::MissingRequiredField("database"));
}

#[test]
fn test_empty_fields() {
    let err = passthrough(r#"{"database":"bigquery","tableName":"t","fields":[]}"#).unwrap_err();
    assert_eq!(err, CompileError::MissingRequiredField("fields"));
    assert_eq!(err.to_string(), "Missing required field: fields");
}

#[test]
fn test_unsupported_database() {
    let err =
        passthrough(r#"{"database":"teradata","tableName":"t","fields":[{"column":"a"}]}"#)
            .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported database: teradata");
}

#[test]
fn test_database_names_are_case_insensitive() {
    for db in ["BigQuery", "SNOWFLAKE", "PostgreSQL", "mysql", "Redshift"] {
        let json = format!(
            r#"{{"database":"{db}","tableName":"t","fields":[{{"column":"a"}}]}}"#
        );
        assert_eq!(passthrough(&json).unwrap(), "SELECT a FROM t");
    }
}

// ============================================================================
// Strict Identifier Policy
// ============================================================================

#[test]
fn test_strict_accepts_plain_identifiers() {
    let sql = strict(
        r#"{
            "database": "snowflake",
            "tableName": "analytics.orders",
            "fields": [{"column": "o.region", "alias": "region"}],
            "aggregation": [{"function": "COUNT_DISTINCT", "column": "customer_id", "alias": "customers"}]
        }"#,
    )
    .unwrap();

    assert_snapshot!(sql, @"SELECT o.region AS region, COUNT(DISTINCT customer_id) AS customers FROM analytics.orders");
}

#[test]
fn test_strict_rejects_injection_through_column() {
    let err = strict(
        r#"{
            "database": "bigquery",
            "tableName": "t",
            "fields": [{"column": "a FROM t; DROP TABLE t; --", "alias": ""}]
        }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::InvalidIdentifier { kind: "column", .. }));
}

#[test]
fn test_strict_rejects_leading_digit() {
    let err = strict(
        r#"{"database":"bigquery","tableName":"1table","fields":[{"column":"a"}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::InvalidIdentifier { kind: "table", .. }));
}

#[test]
fn test_strict_rejects_unknown_function() {
    let err = strict(
        r#"{
            "database": "bigquery",
            "tableName": "t",
            "fields": [{"column": "a"}],
            "aggregation": [{"function": "SLEEP", "column": "b"}]
        }"#,
    )
    .unwrap_err();
    assert_eq!(err, CompileError::UnknownAggregate("SLEEP".into()));
}

#[test]
fn test_strict_parses_custom_sql() {
    let ok = strict(
        r#"{"database":"bigquery","tableName":"t","fields":[],"customSql":"SELECT a FROM t WHERE b > 1"}"#,
    );
    assert_eq!(ok.unwrap(), "SELECT a FROM t WHERE b > 1");

    let err = strict(
        r#"{"database":"bigquery","tableName":"t","fields":[],"customSql":"SELEC a FROM t"}"#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::InvalidSql(_)));
}

#[test]
fn test_strict_still_checks_presence_first() {
    let err = strict(r#"{"database":"bigquery","tableName":"","fields":[{"column":"a"}]}"#)
        .unwrap_err();
    assert_eq!(err, CompileError::MissingRequiredField("tableName"));
}
