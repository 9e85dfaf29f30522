//! Validated name of the ledger table.
//!
//! The ledger table name ends up inside DDL and queries, so it is checked
//! against a conservative identifier grammar before any SQL is built:
//! one or two dot-separated parts, each `[A-Za-z_][A-Za-z0-9_]*`, at most
//! [`MAX_IDENT_LEN`] bytes per part.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::quote_qualified;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted identifier part (PostgreSQL's NAMEDATALEN - 1).
pub const MAX_IDENT_LEN: usize = 63;

/// Default ledger table name.
pub const DEFAULT_LEDGER_TABLE: &str = "schema_migrations";

/// A ledger table name, optionally schema-qualified (`ops.schema_migrations`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LedgerTable(String);

impl LedgerTable {
    /// Validate `name` and wrap it.
    pub fn parse(name: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidLedgerTable {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 {
            return Err(invalid("expected `table` or `schema.table`"));
        }
        for part in parts {
            validate_ident(part).map_err(invalid)?;
        }
        Ok(Self(name.to_string()))
    }

    /// The name as written (unquoted).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name rendered as quoted identifier(s), e.g. `"ops"."schema_migrations"`.
    pub fn quoted(&self) -> String {
        quote_qualified(&self.0)
    }

    /// Schema part, if the name is qualified.
    pub fn schema(&self) -> Option<&str> {
        self.0.split_once('.').map(|(schema, _)| schema)
    }

    /// Table part without any schema.
    pub fn table(&self) -> &str {
        match self.0.split_once('.') {
            Some((_, table)) => table,
            None => &self.0,
        }
    }

    /// Name of a companion object living next to the ledger, e.g. the id
    /// sequence `ops.schema_migrations_id_seq`.
    pub fn companion(&self, suffix: &str) -> String {
        match self.schema() {
            Some(schema) => format!("{}.{}_{}", schema, self.table(), suffix),
            None => format!("{}_{}", self.table(), suffix),
        }
    }
}

impl Default for LedgerTable {
    fn default() -> Self {
        Self(DEFAULT_LEDGER_TABLE.to_string())
    }
}

fn validate_ident(part: &str) -> Result<(), &'static str> {
    let mut chars = part.chars();
    match chars.next() {
        None => return Err("empty identifier part"),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => return Err("identifier must start with a letter or underscore"),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("identifier may only contain ASCII letters, digits and underscores");
    }
    if part.len() > MAX_IDENT_LEN {
        return Err("identifier is longer than 63 bytes");
    }
    Ok(())
}

impl fmt::Display for LedgerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LedgerTable {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LedgerTable {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for LedgerTable {
    type Error = CoreError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<LedgerTable> for String {
    fn from(t: LedgerTable) -> Self {
        t.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let t = LedgerTable::parse("schema_migrations").unwrap();
        assert_eq!(t.as_str(), "schema_migrations");
        assert_eq!(t.quoted(), r#""schema_migrations""#);
        assert_eq!(t.schema(), None);
        assert_eq!(t.table(), "schema_migrations");
    }

    #[test]
    fn test_parse_qualified_name() {
        let t = LedgerTable::parse("ops.ledger").unwrap();
        assert_eq!(t.quoted(), r#""ops"."ledger""#);
        assert_eq!(t.schema(), Some("ops"));
        assert_eq!(t.table(), "ledger");
    }

    #[test]
    fn test_companion_name() {
        assert_eq!(
            LedgerTable::parse("ledger").unwrap().companion("id_seq"),
            "ledger_id_seq"
        );
        assert_eq!(
            LedgerTable::parse("ops.ledger").unwrap().companion("id_seq"),
            "ops.ledger_id_seq"
        );
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for bad in [
            "migrations; DROP TABLE users",
            "migrations--",
            "\"quoted\"",
            "a b",
            "1migrations",
            "a.b.c",
            "",
            ".ledger",
            "ops.",
        ] {
            let err = LedgerTable::parse(bad).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidLedgerTable { .. }),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_overlong_identifier() {
        let long = "x".repeat(MAX_IDENT_LEN + 1);
        assert!(LedgerTable::parse(&long).is_err());
        assert!(LedgerTable::parse(&"x".repeat(MAX_IDENT_LEN)).is_ok());
    }

    #[test]
    fn test_default() {
        assert_eq!(LedgerTable::default().as_str(), DEFAULT_LEDGER_TABLE);
    }

    #[test]
    fn test_serde_validates() {
        let t: LedgerTable = serde_json::from_str(r#""ops.ledger""#).unwrap();
        assert_eq!(t.as_str(), "ops.ledger");
        assert!(serde_json::from_str::<LedgerTable>(r#""drop table x""#).is_err());
        assert_eq!(serde_json::to_string(&t).unwrap(), r#""ops.ledger""#);
    }
}
