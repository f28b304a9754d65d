use super::completion::{complete_grouped_periods, complete_periods, grouped_aggregate, scalar_aggregate};
use super::{Metric, MetricDef, MetricError, MetricResult, MetricValue};
use crate::filters::MetricFilters;
use crate::query::{QueryContext, SqlQuery, fragment};

/// Builds the unscoped query of a counting metric.
pub type QueryFn = fn(&QueryContext<'_>, &MetricFilters) -> Result<SqlQuery, MetricError>;

/// Computes the ranked list of a metric for a window of `days`.
pub type ListFn = fn(&QueryContext<'_>, &MetricFilters, u32) -> Result<MetricResult, MetricError>;

/// A metric counting rows of a single query.
///
/// The query names its count column after the metric id. The fragment of the active
/// dimension filter is added to it before rendering, so every counting metric is
/// scoped and grouped the same way. Metrics without a query only produce their ranked
/// list and report their counts as unsupported.
#[derive(Debug)]
pub struct CountMetric {
    def: MetricDef,
    query: Option<QueryFn>,
    list: Option<ListFn>,
}

impl CountMetric {
    #[must_use]
    pub const fn new(def: MetricDef, query: QueryFn) -> Self {
        Self {
            def,
            query: Some(query),
            list: None,
        }
    }

    /// A metric whose count is not computed.
    #[must_use]
    pub const fn inert(def: MetricDef) -> Self {
        Self {
            def,
            query: None,
            list: None,
        }
    }

    #[must_use]
    pub const fn with_list(mut self, list: ListFn) -> Self {
        self.list = Some(list);
        self
    }

    fn scoped_query(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<SqlQuery, MetricError> {
        let Some(query) = self.query else {
            return Err(MetricError::unsupported(self.def.id, "only available as a ranked list"));
        };

        let frag = fragment(self.def.data_source, filters.dimension(), ctx.identities())?;
        Ok(query(ctx, filters)?.with_fragment(&frag))
    }
}

impl Metric for CountMetric {
    fn def(&self) -> &MetricDef {
        &self.def
    }

    fn agg(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        let query = self.scoped_query(ctx, filters)?;
        let rows = ctx.execute(&query.global(filters.range()))?;

        Ok(if query.item_field().is_some() {
            grouped_aggregate(&rows, &[self.def.id])
        } else {
            scalar_aggregate(&rows, &[self.def.id])
        })
    }

    fn ts(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        let query = self.scoped_query(ctx, filters)?;
        let rows = ctx.execute(&query.periodic(filters.period(), filters.range()))?;

        Ok(if query.item_field().is_some() {
            complete_grouped_periods(&rows, filters.period(), filters.range(), &[self.def.id])
        } else {
            complete_periods(&rows, filters.period(), filters.range(), &[self.def.id])
        })
    }

    fn list(&self, ctx: &QueryContext<'_>, filters: &MetricFilters, days: u32) -> Result<MetricResult, MetricError> {
        match self.list {
            Some(list) => list(ctx, filters, days),
            None => Err(MetricError::unsupported(self.def.id, "no ranked list is defined")),
        }
    }
}

/// Run a ranking query and return each of its `columns` as a list, in rank order.
pub fn ranked_list(ctx: &QueryContext<'_>, query: &SqlQuery, filters: &MetricFilters, columns: &[&str]) -> Result<MetricResult, MetricError> {
    let rows = ctx.execute(&query.global(filters.range()))?;

    let mut result = MetricResult::new();
    for column in columns {
        let values = rows
            .column(column)
            .map(|values| values.map(MetricValue::from).collect::<Vec<_>>())
            .unwrap_or_default();
        result.set(*column, values);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DateRange, Dimension, DimensionFilter, Period};
    use crate::metrics::metric_def;
    use crate::query::SqlValue;
    use crate::query::testing::ScriptedExecutor;
    use chrono::NaiveDate;
    use serde_json::json;

    static COMMITS: CountMetric = CountMetric::new(metric_def!(Scm, "ncommits", "Commits", "Number of commits"), |_, _| {
        Ok(SqlQuery::new("s.date").field("COUNT(DISTINCT(s.id)) AS ncommits").table("scmlog s"))
    });

    static INERT: CountMetric = CountMetric::inert(metric_def!(Scr, "domains", "Domains", "Number of domains"));

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn january() -> MetricFilters {
        MetricFilters::new(Period::Month, DateRange::new(date(2014, 1, 1), date(2014, 2, 1)).unwrap())
    }

    #[test]
    fn test_agg_scalar() {
        let executor = ScriptedExecutor::new().on("COUNT(DISTINCT(s.id))", &["ncommits"], vec![vec![SqlValue::Integer(12)]]);
        let ctx = QueryContext::new(&executor, None);

        let result = COMMITS.agg(&ctx, &january()).unwrap();
        assert_eq!(result.to_json(), json!({"ncommits": 12}));
    }

    #[test]
    fn test_agg_is_idempotent() {
        let executor = ScriptedExecutor::new().on("ncommits", &["ncommits"], vec![vec![SqlValue::Integer(3)]]);
        let ctx = QueryContext::new(&executor, None);
        assert_eq!(COMMITS.agg(&ctx, &january()).unwrap(), COMMITS.agg(&ctx, &january()).unwrap());
    }

    #[test]
    fn test_ts_single_month() {
        let executor = ScriptedExecutor::new().on(
            "GROUP BY",
            &["month", "ncommits"],
            vec![vec![SqlValue::from("2014-01"), SqlValue::Integer(12)]],
        );
        let ctx = QueryContext::new(&executor, None);

        let result = COMMITS.ts(&ctx, &january()).unwrap();
        assert_eq!(result.to_json(), json!({"month": ["2014-01"], "ncommits": [12]}));
    }

    #[test]
    fn test_scoped_query_carries_fragment() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let filters = january().with_dimension(Some(DimensionFilter::scoped(Dimension::Repository, "libfoo")));

        let _ = COMMITS.agg(&ctx, &filters).unwrap();
        let sql = executor.executed().remove(0);
        assert!(sql.contains("FROM scmlog s, repositories r"));
        assert!(sql.contains("r.name = 'libfoo'"));
    }

    #[test]
    fn test_all_items_groups_by_name() {
        let executor = ScriptedExecutor::new().on(
            "r.name AS name",
            &["name", "ncommits"],
            vec![vec![SqlValue::from("repoA"), SqlValue::Integer(2)]],
        );
        let ctx = QueryContext::new(&executor, None);
        let filters = january().with_dimension(Some(DimensionFilter::all_items(Dimension::Repository)));

        let result = COMMITS.agg(&ctx, &filters).unwrap();
        assert_eq!(result.to_json(), json!({"name": ["repoA"], "ncommits": [2]}));
    }

    #[test]
    fn test_missing_identities_is_a_configuration_error() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let filters = january().with_dimension(Some(DimensionFilter::scoped(Dimension::Company, "Acme")));

        let err = COMMITS.agg(&ctx, &filters).unwrap_err();
        assert!(err.is_fatal());
        assert!(executor.executed().is_empty());
    }

    #[test]
    fn test_inert_metric_is_unsupported() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);

        assert!(matches!(INERT.agg(&ctx, &january()), Err(MetricError::Unsupported { metric: "domains", .. })));
        assert!(matches!(INERT.ts(&ctx, &january()), Err(MetricError::Unsupported { .. })));
        assert!(matches!(INERT.list(&ctx, &january(), 0), Err(MetricError::Unsupported { .. })));
    }

    #[test]
    fn test_trends_compare_with_previous_window() {
        let executor = ScriptedExecutor::new()
            .on("s.date >= '2014-01-25'", &["ncommits"], vec![vec![SqlValue::Integer(6)]])
            .on("s.date >= '2014-01-18'", &["ncommits"], vec![vec![SqlValue::Integer(4)]]);
        let ctx = QueryContext::new(&executor, None);

        let result = COMMITS.trends(&ctx, &january(), date(2014, 2, 1), 7).unwrap();
        assert_eq!(
            result.to_json(),
            json!({"ncommits_7": 6, "diff_netncommits_7": 2, "percentage_ncommits_7": 50.0})
        );
    }

    #[test]
    fn test_trends_with_empty_previous_window_yield_null() {
        let executor = ScriptedExecutor::new().on("s.date >= '2014-01-25'", &["ncommits"], vec![vec![SqlValue::Integer(3)]]);
        let ctx = QueryContext::new(&executor, None);

        let result = COMMITS.trends(&ctx, &january(), date(2014, 2, 1), 7).unwrap();
        assert_eq!(result.get("ncommits_7"), Some(&MetricValue::Int(3)));
        assert_eq!(result.get("diff_netncommits_7"), Some(&MetricValue::Int(3)));
        assert_eq!(result.get("percentage_ncommits_7"), Some(&MetricValue::Null));
    }

    #[test]
    fn test_trends_are_not_computed_per_item() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let filters = january().with_dimension(Some(DimensionFilter::all_items(Dimension::Repository)));
        assert!(matches!(
            COMMITS.trends(&ctx, &filters, date(2014, 2, 1), 30),
            Err(MetricError::Unsupported { .. })
        ));
    }
}
