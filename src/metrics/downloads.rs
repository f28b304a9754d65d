//! Metrics of the package downloads log.
//!
//! Each row of `downloads d` is one download of a package over some protocol from
//! an IP address. No dimension applies.

use super::count_metric::{CountMetric, ranked_list};
use super::metric_def::metric_def;
use super::registry::{ALL_TIME_WINDOW, DataSourceProfile, TopRole};
use super::{MetricError, MetricResult};
use crate::filters::MetricFilters;
use crate::query::{QueryContext, SqlQuery};

/// Length of the download rankings, regardless of the configured number of people.
const TOP_LIMIT: u32 = 20;

fn downloads(field: &str) -> SqlQuery {
    SqlQuery::new("d.date").field(field).table("downloads d")
}

pub static DOWNLOADS: CountMetric = CountMetric::new(
    metric_def!(Downloads, "downloads", "Downloads", "Number of downloads"),
    |_, _| Ok(downloads("COUNT(*) AS downloads")),
);

pub static PACKAGES: CountMetric = CountMetric::new(
    metric_def!(Downloads, "packages", "Packages", "Number of distinct packages downloaded"),
    |_, _| Ok(downloads("COUNT(DISTINCT(d.package)) AS packages")),
)
.with_list(|ctx, filters, _| top_downloads(ctx, filters, "d.package", "packages"));

pub static PROTOCOLS: CountMetric = CountMetric::new(
    metric_def!(Downloads, "protocols", "Protocols", "Number of distinct protocols used to download"),
    |_, _| Ok(downloads("COUNT(DISTINCT(d.protocol)) AS protocols")),
);

pub static IPS: CountMetric = CountMetric::new(
    metric_def!(Downloads, "ips", "IPs", "Number of distinct addresses downloading packages"),
    |_, _| Ok(downloads("COUNT(DISTINCT(d.ip)) AS ips")),
)
.with_list(|ctx, filters, _| top_downloads(ctx, filters, "d.ip", "ips"));

/// Values of `column` ranked by how many downloads they account for.
fn top_downloads(ctx: &QueryContext<'_>, filters: &MetricFilters, column: &str, alias: &str) -> Result<MetricResult, MetricError> {
    let query = downloads("COUNT(*) AS downloads")
        .field(format!("{column} AS {alias}"))
        .group_by(column)
        .order_by("downloads DESC")
        .order_by(alias)
        .limit(TOP_LIMIT);

    ranked_list(ctx, &query, filters, &[alias, "downloads"])
}

pub static PROFILE: DataSourceProfile = DataSourceProfile {
    metrics: &[&DOWNLOADS, &PACKAGES, &PROTOCOLS, &IPS],
    core_ts: &["downloads", "packages", "protocols", "ips"],
    core_agg: &["downloads", "packages", "protocols", "ips"],
    core_trends: &["downloads", "packages"],
    core_reports: &[],
    not_under_filters: &[],
    change_series: &[],
    top_roles: &[
        TopRole {
            role: "ips",
            metric: "ips",
            windows: ALL_TIME_WINDOW,
        },
        TopRole {
            role: "packages",
            metric: "packages",
            windows: ALL_TIME_WINDOW,
        },
    ],
    catalogue_metric: None,
    summary_metrics: &[],
    person_metrics: &[],
    activity: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DateRange, Dimension, DimensionFilter, Period};
    use crate::metrics::{Metric, MetricValue};
    use crate::query::SqlValue;
    use crate::query::testing::ScriptedExecutor;
    use chrono::NaiveDate;

    fn filters() -> MetricFilters {
        MetricFilters::new(
            Period::Month,
            DateRange::new(
                NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2014, 7, 1).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_top_ips_ignore_npeople() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);

        let list = IPS.list(&ctx, &filters().with_npeople(3), 0).unwrap();
        assert!(list.contains_key("ips"));
        assert!(list.contains_key("downloads"));
        insta::assert_snapshot!(
            executor.executed().remove(0),
            @"SELECT COUNT(*) AS downloads, d.ip AS ips FROM downloads d WHERE d.date >= '2014-01-01' AND d.date < '2014-07-01' GROUP BY d.ip ORDER BY downloads DESC, ips LIMIT 20"
        );
    }

    #[test]
    fn test_no_dimension_is_supported() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let filters = filters().with_dimension(Some(DimensionFilter::all_items(Dimension::Repository)));

        assert!(matches!(
            DOWNLOADS.agg(&ctx, &filters),
            Err(MetricError::UnsupportedDimension { .. })
        ));
        assert!(executor.executed().is_empty());
    }

    #[test]
    fn test_downloads_total() {
        let executor = ScriptedExecutor::new().on("COUNT(*) AS downloads", &["downloads"], vec![vec![SqlValue::Integer(1234)]]);
        let ctx = QueryContext::new(&executor, None);
        assert_eq!(DOWNLOADS.agg(&ctx, &filters()).unwrap().get("downloads"), Some(&MetricValue::Int(1234)));
    }
}
