use super::{IdentitiesDb, QueryExecutor, QueryResult, SqlValue, sql_literal};
use crate::Result;
use camino::Utf8Path;
use ohno::IntoAppError;
use rusqlite::Connection;
use rusqlite::types::ValueRef;

const LOG_TARGET: &str = "    sqlite";

/// Query executor backed by a `SQLite` database.
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Open an existing database file.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        log::debug!(target: LOG_TARGET, "Opening database '{path}'");
        let conn = Connection::open(path).into_app_err_with(|| format!("opening database '{path}'"))?;
        Ok(Self { conn })
    }

    /// Create an empty in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().into_app_err("creating in-memory database")?;
        Ok(Self { conn })
    }

    /// Make the database at `path` reachable under the `schema` name.
    pub fn attach(&self, path: &str, schema: &IdentitiesDb) -> Result<()> {
        log::debug!(target: LOG_TARGET, "Attaching '{path}' as '{schema}'");
        self.conn
            .execute_batch(&format!("ATTACH DATABASE {} AS {}", sql_literal(path), schema.name()))
            .into_app_err_with(|| format!("attaching '{path}' as '{schema}'"))
    }

    /// Run one or more statements that produce no rows.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).into_app_err("executing SQL batch")
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, sql: &str) -> Result<QueryResult> {
        log::trace!(target: LOG_TARGET, "{sql}");

        let mut stmt = self.conn.prepare(sql).into_app_err_with(|| format!("preparing query: {sql}"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).into_app_err_with(|| format!("running query: {sql}"))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(SqlValue::from(row.get_ref(index)?));
            }
            rows.push(values);
        }

        Ok(QueryResult::new(columns, rows))
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null | ValueRef::Blob(_) => Self::Null,
            ValueRef::Integer(value) => Self::Integer(value),
            ValueRef::Real(value) => Self::Real(value),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}
