//! SQL quoting for role management statements.
//!
//! Role names and passwords cannot be bound as statement parameters in
//! `CREATE ROLE`/`GRANT`, so they are interpolated with explicit quoting.

/// Quote an identifier (role, database, schema name).
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal (passwords).
pub(crate) fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}
