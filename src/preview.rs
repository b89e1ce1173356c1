//! Preview compiler behind `/api/generate-query`.
//!
//! Unlike [`crate::compile`] this quotes every identifier for the target
//! database and always aliases each column. Aggregations, window rows and
//! custom SQL are ignored.

use crate::model::QueryRequest;
use crate::sql::token::{Token, TokenStream};
use crate::sql::Dialect;

/// Render a preview SELECT for `request`.
///
/// The database is looked up by display or wire name; anything unknown
/// (including a missing name) is rendered as BigQuery. With no fields the
/// select list is `*`.
pub fn preview_sql(request: &QueryRequest) -> String {
    let dialect = request
        .database()
        .and_then(|name| name.parse::<Dialect>().ok())
        .unwrap_or_default();

    let items: Vec<TokenStream> = request
        .fields
        .iter()
        .map(|field| {
            let mut ts = TokenStream::new();
            ts.push(Token::Ident(field.column.clone()))
                .space()
                .push(Token::As)
                .space()
                .push(Token::Ident(
                    field.alias().unwrap_or(&field.column).to_string(),
                ));
            ts
        })
        .collect();

    let mut ts = TokenStream::new();
    ts.push(Token::Select).space();
    if items.is_empty() {
        ts.push(Token::Star);
    } else {
        ts.join_comma(&items);
    }
    ts.space()
        .push(Token::From)
        .space()
        .push(Token::Ident(
            request.table_name.clone().unwrap_or_default(),
        ));

    ts.serialize(dialect)
}
