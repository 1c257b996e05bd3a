//! SQL dialects the statements can be rendered in.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Amazon Redshift, the production warehouse.
    Redshift,
    /// SQLite, for local runs and tests.
    Sqlite,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnquotableLiteral(pub String);

impl fmt::Display for UnquotableLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value contains a NUL character: {:?}", self.0)
    }
}

impl std::error::Error for UnquotableLiteral {}

impl Dialect {
    /// Renders `value` as a single-quoted string literal.
    ///
    /// Single quotes are doubled. Redshift additionally treats backslash as an
    /// escape character inside COPY literals, so backslashes are doubled there.
    pub fn quote_literal(&self, value: &str) -> Result<String, UnquotableLiteral> {
        if value.contains('\0') {
            return Err(UnquotableLiteral(value.to_string()));
        }
        let escaped = match self {
            Dialect::Redshift => value.replace('\\', "\\\\").replace('\'', "''"),
            Dialect::Sqlite => value.replace('\'', "''"),
        };
        Ok(format!("'{}'", escaped))
    }

    /// Expression ordering rows of a staging table by load order, used to
    /// pick the first-seen row of a group. Redshift keeps no load order, so
    /// the given content columns stand in for it.
    pub fn load_order(&self, content_columns: &[&str]) -> String {
        match self {
            Dialect::Sqlite => "rowid".to_string(),
            Dialect::Redshift => content_columns.join(", "),
        }
    }
}
