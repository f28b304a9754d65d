use crate::Result;

static NULL: SqlValue = SqlValue::Null;

/// Runs SQL text and returns the rows it produced.
///
/// Implementations own the connection; the rest of the crate only ever sees SQL
/// going in and a [`QueryResult`] coming out.
pub trait QueryExecutor: core::fmt::Debug {
    fn execute(&self, sql: &str) -> Result<QueryResult>;
}

/// A single cell of a query result
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "activity counts are far below 2^52")]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            Self::Text(value) => value.parse().ok(),
            Self::Null => None,
        }
    }

    /// Textual form of the value, used for item names and identifiers.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(value.to_string()),
            Self::Null => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Columnar result of a query: named columns and the rows holding their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Every value of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &SqlValue>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.get(index).unwrap_or(&NULL)))
    }

    /// Value of the named column in the first row.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&SqlValue> {
        let index = self.column_index(name)?;
        self.rows.first().and_then(|row| row.get(index))
    }
}
