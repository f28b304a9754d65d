use super::{IdentitiesDb, QueryExecutor, QueryResult};
use crate::metrics::MetricError;

const LOG_TARGET: &str = "     query";

/// Everything a metric needs to reach its data: the executor and, when available,
/// the schema holding unique identities, affiliations and projects.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    executor: &'a dyn QueryExecutor,
    identities: Option<&'a IdentitiesDb>,
}

impl<'a> QueryContext<'a> {
    #[must_use]
    pub const fn new(executor: &'a dyn QueryExecutor, identities: Option<&'a IdentitiesDb>) -> Self {
        Self { executor, identities }
    }

    #[must_use]
    pub const fn identities(&self) -> Option<&'a IdentitiesDb> {
        self.identities
    }

    /// The identities schema, or a configuration error naming what needed it.
    pub fn require_identities(&self, needed_by: &str) -> Result<&'a IdentitiesDb, MetricError> {
        self.identities
            .ok_or_else(|| MetricError::Configuration(format!("{needed_by} requires an identities database")))
    }

    pub fn execute(&self, sql: &str) -> Result<QueryResult, MetricError> {
        log::debug!(target: LOG_TARGET, "{sql}");
        self.executor.execute(sql).map_err(MetricError::Query)
    }
}
