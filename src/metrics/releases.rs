//! Metrics of the package releases database.
//!
//! Modules are rows of `projects p` and each published version is a row of
//! `releases r`. Release authors are plain `users u` accounts with no unique identity
//! mapping, so the only dimension supported is a single person.

use super::count_metric::{CountMetric, ranked_list};
use super::metric_def::metric_def;
use super::registry::{DataSourceProfile, STANDARD_WINDOWS, TopRole};
use super::{DataSource, MetricError, MetricResult};
use crate::filters::MetricFilters;
use crate::query::{QueryContext, SqlQuery};

fn releases(field: &str) -> SqlQuery {
    SqlQuery::new("r.created_on")
        .field(field)
        .table("releases r")
        .table("projects p")
        .condition("r.project_id = p.id")
}

pub static MODULES: CountMetric = CountMetric::new(
    metric_def!(Releases, "modules", "Modules", "Number of modules published"),
    |_, filters| {
        // modules have no author, so not even the people dimension applies
        if let Some(filter) = filters.dimension() {
            return Err(MetricError::UnsupportedDimension {
                data_source: DataSource::Releases,
                dimension: filter.dimension(),
            });
        }
        Ok(SqlQuery::new("p.created_on").field("COUNT(*) AS modules").table("projects p"))
    },
);

pub static RELEASES: CountMetric = CountMetric::new(
    metric_def!(Releases, "releases", "Releases", "Number of releases of all modules"),
    |_, _| Ok(releases("COUNT(DISTINCT(r.id)) AS releases")),
);

pub static AUTHORS: CountMetric = CountMetric::new(
    metric_def!(Releases, "authors", "Authors", "Number of people publishing releases"),
    |_, _| {
        Ok(releases("COUNT(DISTINCT(u.id)) AS authors")
            .table("users u")
            .condition("r.author_id = u.id"))
    },
)
.with_list(top_authors);

/// Accounts ranked by the number of releases they published.
fn top_authors(ctx: &QueryContext<'_>, filters: &MetricFilters, days: u32) -> Result<MetricResult, MetricError> {
    let query = releases("COUNT(DISTINCT(r.id)) AS releases")
        .field("u.id AS id")
        .field("u.username AS authors")
        .table("users u")
        .condition("r.author_id = u.id")
        .exclude("u.username", filters.bots())
        .within_days_of_latest(days, "releases", "created_on")
        .group_by("u.id")
        .order_by("releases DESC")
        .order_by("authors")
        .limit(filters.npeople());

    ranked_list(ctx, &query, filters, &["id", "authors", "releases"])
}

pub static PROFILE: DataSourceProfile = DataSourceProfile {
    metrics: &[&AUTHORS, &MODULES, &RELEASES],
    core_ts: &["authors", "modules", "releases"],
    core_agg: &["authors", "modules", "releases"],
    core_trends: &["authors", "modules", "releases"],
    core_reports: &[],
    not_under_filters: &["modules", "authors"],
    change_series: &[],
    top_roles: &[TopRole {
        role: "authors",
        metric: "authors",
        windows: STANDARD_WINDOWS,
    }],
    catalogue_metric: None,
    summary_metrics: &[],
    person_metrics: &["releases"],
    activity: Some(("releases r", "r.created_on")),
};
