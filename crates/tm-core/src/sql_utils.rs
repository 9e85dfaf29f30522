//! SQL identifier quoting utilities
//!
//! Provides quoting for SQL identifiers and qualified names used when
//! building the ledger DDL and queries.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("schema_migrations"), r#""schema_migrations""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `ops.schema_migrations`).
///
/// Splits on `.` and individually quotes each component.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("migrations"), r#""migrations""#);
/// assert_eq!(quote_qualified("ops.migrations"), r#""ops"."migrations""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
