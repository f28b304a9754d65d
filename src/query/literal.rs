use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::bail;
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid regex"));

/// Render `value` as a single-quoted SQL string literal.
#[must_use]
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Schema name under which the identities database is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentitiesDb(String);

impl IdentitiesDb {
    /// Schema name used when the identities database is attached by this crate.
    pub const DEFAULT_SCHEMA: &'static str = "identities";

    pub fn new(schema: impl Into<String>) -> Result<Self> {
        let schema = schema.into();
        if !IDENTIFIER_REGEX.is_match(&schema) {
            bail!("'{schema}' is not a valid schema name");
        }

        Ok(Self(schema))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Qualified name of a table living in the identities database.
    #[must_use]
    pub fn table(&self, table: &str) -> String {
        format!("{}.{table}", self.0)
    }
}

impl Default for IdentitiesDb {
    fn default() -> Self {
        Self(Self::DEFAULT_SCHEMA.to_string())
    }
}

impl Display for IdentitiesDb {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
