//! Metrics of the source code management database.
//!
//! Commits live in `scmlog s`, dated by `s.date`. Authors are mapped to unique
//! identities through `people_upeople`, and affiliations come from the identities
//! database.

use super::count_metric::{CountMetric, ranked_list};
use super::metric_def::metric_def;
use super::registry::{DataSourceProfile, STANDARD_WINDOWS, TopRole};
use super::{MetricError, MetricResult};
use crate::filters::MetricFilters;
use crate::query::{QueryContext, SqlQuery, company_join, country_join, domain_join, people_join};

fn commits(field: &str) -> SqlQuery {
    SqlQuery::new("s.date").field(field).table("scmlog s")
}

pub static NCOMMITS: CountMetric = CountMetric::new(
    metric_def!(Scm, "ncommits", "Commits", "Number of commits, changes to the source code"),
    |_, _| Ok(commits("COUNT(DISTINCT(s.id)) AS ncommits")),
);

pub static AUTHORS: CountMetric = CountMetric::new(
    metric_def!(Scm, "authors", "Authors", "Number of unique people authoring commits"),
    |_, _| Ok(commits("COUNT(DISTINCT(pup.upeople_id)) AS authors").with_fragment(&people_join("s.author_id"))),
)
.with_list(top_authors);

pub static COMMITTERS: CountMetric = CountMetric::new(
    metric_def!(Scm, "committers", "Committers", "Number of people committing changes to the repositories"),
    |_, _| Ok(commits("COUNT(DISTINCT(s.committer_id)) AS committers")),
);

pub static REPOSITORIES: CountMetric = CountMetric::new(
    metric_def!(Scm, "repositories", "Repositories", "Number of repositories with commits"),
    |_, _| Ok(commits("COUNT(DISTINCT(s.repository_id)) AS repositories")),
);

pub static FILES: CountMetric = CountMetric::new(
    metric_def!(Scm, "files", "Files", "Number of distinct files touched by commits"),
    |_, _| {
        Ok(commits("COUNT(DISTINCT(a.file_id)) AS files")
            .table("actions a")
            .condition("a.commit_id = s.id"))
    },
);

pub static COMPANIES: CountMetric = CountMetric::new(
    metric_def!(Scm, "companies", "Organizations", "Number of organizations with people authoring commits"),
    |ctx, _| {
        let ids = ctx.require_identities("companies")?;
        Ok(commits("COUNT(DISTINCT(upc.company_id)) AS companies").with_fragment(&company_join(ids, "s.author_id", "s.date")))
    },
);

pub static COUNTRIES: CountMetric = CountMetric::new(
    metric_def!(Scm, "countries", "Countries", "Number of countries with people authoring commits"),
    |ctx, _| {
        let ids = ctx.require_identities("countries")?;
        Ok(commits("COUNT(DISTINCT(upcn.country_id)) AS countries").with_fragment(&country_join(ids, "s.author_id")))
    },
);

pub static DOMAINS: CountMetric = CountMetric::new(
    metric_def!(Scm, "domains", "Domains", "Number of e-mail domains of people authoring commits"),
    |ctx, _| {
        let ids = ctx.require_identities("domains")?;
        Ok(commits("COUNT(DISTINCT(upd.domain_id)) AS domains").with_fragment(&domain_join(ids, "s.author_id")))
    },
);

/// Authors ranked by the number of commits they made.
fn top_authors(ctx: &QueryContext<'_>, filters: &MetricFilters, days: u32) -> Result<MetricResult, MetricError> {
    let ids = ctx.require_identities("the authors ranking")?;
    let query = SqlQuery::new("s.date")
        .field("u.id AS id")
        .field("u.identifier AS authors")
        .field("COUNT(DISTINCT(s.id)) AS commits")
        .table("scmlog s")
        .with_fragment(&people_join("s.author_id"))
        .table(format!("{} u", ids.table("upeople")))
        .condition("pup.upeople_id = u.id")
        .exclude("u.identifier", filters.bots())
        .within_days_of_latest(days, "scmlog", "date")
        .group_by("u.id")
        .order_by("commits DESC")
        .order_by("authors")
        .limit(filters.npeople());

    ranked_list(ctx, &query, filters, &["id", "authors", "commits"])
}

pub static PROFILE: DataSourceProfile = DataSourceProfile {
    metrics: &[
        &NCOMMITS,
        &AUTHORS,
        &COMMITTERS,
        &REPOSITORIES,
        &FILES,
        &COMPANIES,
        &COUNTRIES,
        &DOMAINS,
    ],
    core_ts: &["ncommits", "authors", "committers", "repositories", "files"],
    core_agg: &["ncommits", "authors", "committers", "repositories", "files"],
    core_trends: &["ncommits", "authors", "files"],
    core_reports: &["companies", "countries", "domains"],
    not_under_filters: &[],
    change_series: &[],
    top_roles: &[TopRole {
        role: "authors",
        metric: "authors",
        windows: STANDARD_WINDOWS,
    }],
    catalogue_metric: Some("ncommits"),
    summary_metrics: &["ncommits", "authors"],
    person_metrics: &["ncommits"],
    activity: Some(("scmlog s", "s.date")),
};
