//! Scripted executor for unit tests.

use super::{QueryExecutor, QueryResult, SqlValue};
use crate::Result;
use core::cell::RefCell;

/// Returns canned results for SQL containing a given substring and records every query.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Vec<(String, QueryResult)>,
    executed: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `needle` with `columns` and `rows`. Earlier entries win.
    pub fn on(mut self, needle: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
        let columns = columns.iter().map(ToString::to_string).collect();
        self.script.push((needle.to_string(), QueryResult::new(columns, rows)));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.executed.borrow_mut().push(sql.to_string());
        Ok(self
            .script
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }
}
