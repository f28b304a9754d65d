//! Metrics of the source code review database.
//!
//! Review requests live in `issues i`, dated by `i.submitted_on`, and carry their
//! current state in `i.status`. Every event on a review (status changes, votes,
//! new patchsets) is a row of `changes c`, dated by `c.changed_on`.

use super::completion::round2;
use super::count_metric::{CountMetric, ranked_list};
use super::metric_def::metric_def;
use super::metric_result::NAME_KEY;
use super::registry::{DataSourceProfile, STANDARD_WINDOWS, TopRole};
use super::{DataSource, Metric, MetricDef, MetricError, MetricResult, MetricValue};
use crate::filters::{MetricFilters, Period};
use crate::query::{QueryContext, QueryResult, SqlQuery, SqlValue, company_join, country_join, fragment, people_join, sql_literal};
use std::collections::{BTreeMap, BTreeSet};

const MEDIAN_KEY: &str = "review_time_days_median";
const AVG_KEY: &str = "review_time_days_avg";

fn reviews(field: String) -> SqlQuery {
    SqlQuery::new("i.submitted_on").field(field).table("issues i")
}

/// Reviews counted by their current status; no status counts every submission.
fn status_count(id: &str, statuses: &[&str]) -> SqlQuery {
    let query = reviews(format!("COUNT(DISTINCT(i.id)) AS {id}"));
    match statuses {
        [] => query,
        [status] => query.condition(format!("i.status = {}", sql_literal(status))),
        _ => {
            let list = statuses.iter().map(|status| sql_literal(status)).collect::<Vec<_>>().join(", ");
            query.condition(format!("i.status IN ({list})"))
        }
    }
}

fn changes(field: String) -> SqlQuery {
    SqlQuery::new("c.changed_on")
        .field(field)
        .table("changes c")
        .table("issues i")
        .condition("c.issue_id = i.id")
}

/// Reviews moved to `status`, dated when the change happened rather than at submission.
fn status_changes(id: &str, status: &str) -> SqlQuery {
    changes(format!("COUNT(DISTINCT(c.issue_id)) AS {id}"))
        .condition("c.field = 'status'")
        .condition(format!("c.new_value = {}", sql_literal(status)))
}

/// Votes of the given kind, under either of the names review systems use for it.
fn evaluations(id: &str, short: &str, long: &str) -> SqlQuery {
    changes(format!("COUNT(DISTINCT(c.id)) AS {id}")).condition(format!(
        "(c.field = {} OR c.field = {})",
        sql_literal(short),
        sql_literal(long)
    ))
}

/// Open reviews whose latest vote has one of `votes`.
///
/// With `per_patchset` the latest vote is taken per patchset of each review and the
/// votes are counted; otherwise it is taken per review and the reviews are counted.
fn waiting(id: &str, per_patchset: bool, votes: [i32; 2]) -> SqlQuery {
    let (group, counted) = if per_patchset {
        ("c2.issue_id, c2.old_value", "c.id")
    } else {
        ("c2.issue_id", "i.id")
    };

    changes(format!("COUNT(DISTINCT({counted})) AS {id}"))
        .table(format!(
            "(SELECT MAX(c2.id) AS id FROM changes c2, issues i2 \
             WHERE c2.issue_id = i2.id AND i2.status = 'NEW' GROUP BY {group}) t1"
        ))
        .condition("t1.id = c.id")
        .condition("(c.field = 'CRVW' OR c.field = 'Code-Review' OR c.field = 'Verified' OR c.field = 'VRIF')")
        .condition(format!("(c.new_value = {} OR c.new_value = {})", votes[0], votes[1]))
}

pub static SUBMITTED: CountMetric = CountMetric::new(
    metric_def!(Scr, "submitted", "Submitted reviews", "Number of submitted code review processes"),
    |_, _| Ok(status_count("submitted", &[])),
);

pub static OPENED: CountMetric = CountMetric::new(
    metric_def!(Scr, "opened", "Opened reviews", "Number of review processes opened"),
    |_, _| Ok(status_count("opened", &["NEW", "WORKINPROGRESS"])),
);

pub static NEW: CountMetric = CountMetric::new(
    metric_def!(Scr, "new", "New reviews", "Number of new review processes"),
    |_, _| Ok(status_count("new", &["NEW"])),
);

pub static IN_PROGRESS: CountMetric = CountMetric::new(
    metric_def!(Scr, "inprogress", "In progress reviews", "Number of review processes in progress"),
    |_, _| Ok(status_count("inprogress", &["WORKINPROGRESS"])),
);

pub static CLOSED: CountMetric = CountMetric::new(
    metric_def!(Scr, "closed", "Closed reviews", "Number of closed review processes (merged or abandoned)"),
    |_, _| Ok(status_count("closed", &["MERGED", "ABANDONED"])),
);

pub static MERGED: CountMetric = CountMetric::new(
    metric_def!(Scr, "merged", "Merged changes", "Number of changes merged into the source code"),
    |_, _| Ok(status_count("merged", &["MERGED"])),
);

pub static ABANDONED: CountMetric = CountMetric::new(
    metric_def!(Scr, "abandoned", "Abandoned reviews", "Number of abandoned review processes"),
    |_, _| Ok(status_count("abandoned", &["ABANDONED"])),
);

pub static MERGED_CHANGES: CountMetric = CountMetric::new(
    metric_def!(Scr, "merged_changes", "Merge events", "Number of reviews merged, dated by the merge"),
    |_, _| Ok(status_changes("merged_changes", "MERGED")),
);

pub static ABANDONED_CHANGES: CountMetric = CountMetric::new(
    metric_def!(Scr, "abandoned_changes", "Abandon events", "Number of reviews abandoned, dated by the abandon"),
    |_, _| Ok(status_changes("abandoned_changes", "ABANDONED")),
);

pub static NEW_CHANGES: CountMetric = CountMetric::new(
    metric_def!(Scr, "new_changes", "Reopen events", "Number of reviews moved back to new, dated by the change"),
    |_, _| Ok(status_changes("new_changes", "NEW")),
);

pub static VERIFIED: CountMetric = CountMetric::new(
    metric_def!(Scr, "verified", "Verified patches reviews", "Number of verification votes on review processes"),
    |_, _| Ok(evaluations("verified", "VRIF", "Verified")),
);

pub static APPROVED: CountMetric = CountMetric::new(
    metric_def!(Scr, "approved", "Approved patches reviews", "Number of approval votes on review processes"),
    |_, _| Ok(evaluations("approved", "APRV", "Approved")),
);

pub static CODE_REVIEW: CountMetric = CountMetric::new(
    metric_def!(Scr, "codereview", "Code review patches", "Number of code review votes on review processes"),
    |_, _| Ok(evaluations("codereview", "CRVW", "Code-Review")),
);

pub static SENT: CountMetric = CountMetric::new(
    metric_def!(Scr, "sent", "Number of patches sent", "Number of patchsets submitted to review processes"),
    |_, _| Ok(evaluations("sent", "SUBM", "Submitted")),
);

pub static WAITING_FOR_REVIEWER: CountMetric = CountMetric::new(
    metric_def!(
        Scr,
        "WaitingForReviewer",
        "Waiting for reviewer patches",
        "Number of patches from review processes waiting for reviewer"
    ),
    |_, _| Ok(waiting("WaitingForReviewer", true, [1, 2])),
);

pub static WAITING_FOR_SUBMITTER: CountMetric = CountMetric::new(
    metric_def!(
        Scr,
        "WaitingForSubmitter",
        "Waiting for submitter patches",
        "Number of patches from review processes waiting for submitter"
    ),
    |_, _| Ok(waiting("WaitingForSubmitter", true, [-1, -2])),
);

pub static REVIEWS_WAITING_FOR_REVIEWER: CountMetric = CountMetric::new(
    metric_def!(
        Scr,
        "ReviewsWaitingForReviewer",
        "Reviews waiting for reviewer",
        "Number of review processes waiting for reviewer"
    ),
    |_, _| Ok(waiting("ReviewsWaitingForReviewer", false, [1, 2])),
);

pub static REVIEWS_WAITING_FOR_SUBMITTER: CountMetric = CountMetric::new(
    metric_def!(
        Scr,
        "ReviewsWaitingForSubmitter",
        "Reviews waiting for submitter",
        "Number of review processes waiting for submitter"
    ),
    |_, _| Ok(waiting("ReviewsWaitingForSubmitter", false, [-1, -2])),
);

pub static COMPANIES: CountMetric = CountMetric::new(
    metric_def!(Scr, "companies", "Organizations", "Number of organizations with people active in code review"),
    |ctx, _| {
        let ids = ctx.require_identities("companies")?;
        Ok(reviews("COUNT(DISTINCT(upc.company_id)) AS companies".into())
            .with_fragment(&company_join(ids, "i.submitted_by", "i.submitted_on")))
    },
);

pub static COUNTRIES: CountMetric = CountMetric::new(
    metric_def!(Scr, "countries", "Countries", "Number of countries with people active in code review"),
    |ctx, _| {
        let ids = ctx.require_identities("countries")?;
        Ok(reviews("COUNT(DISTINCT(upcn.country_id)) AS countries".into()).with_fragment(&country_join(ids, "i.submitted_by")))
    },
);

pub static DOMAINS: CountMetric =
    CountMetric::inert(metric_def!(Scr, "domains", "Domains", "Number of domains with people active in code review"));

pub static PEOPLE: CountMetric =
    CountMetric::inert(metric_def!(Scr, "people", "People", "Number of people active in code review activities"));

pub static REPOSITORIES: CountMetric = CountMetric::new(
    metric_def!(Scr, "repositories", "Repositories", "Number of repositories with people active in code review"),
    |_, _| {
        Ok(reviews("COUNT(DISTINCT(t.id)) AS repositories".into())
            .table("trackers t")
            .condition("t.id = i.tracker_id"))
    },
);

pub static SUBMITTERS: CountMetric = CountMetric::new(
    metric_def!(Scr, "submitters", "Submitters", "Number of people submitting code review processes"),
    |_, _| Ok(reviews("COUNT(DISTINCT(pup.upeople_id)) AS submitters".into()).with_fragment(&people_join("i.submitted_by"))),
)
.with_list(|ctx, filters, days| top_submitters(ctx, filters, days, ("openers", "opened"), &[]));

pub static REVIEWERS: CountMetric = CountMetric::new(
    metric_def!(Scr, "reviewers", "Reviewers", "Number of people reviewing code review activities"),
    |_, _| Ok(changes("COUNT(DISTINCT(c.changed_by)) AS reviewers".into())),
)
.with_list(top_reviewers);

pub static MERGERS: CountMetric = CountMetric::inert(metric_def!(
    Scr,
    "mergers",
    "Successful submitters",
    "Number of people submitting changes that got accepted"
))
.with_list(|ctx, filters, days| top_submitters(ctx, filters, days, ("mergers", "merged"), &["MERGED"]));

pub static CLOSERS: CountMetric = CountMetric::inert(metric_def!(
    Scr,
    "closers",
    "Closers",
    "Number of people closing code review activities"
))
.with_list(|ctx, filters, days| top_submitters(ctx, filters, days, ("closers", "closed"), &["MERGED"]));

/// People ranked by the reviews they submitted, optionally only the ones in `statuses`.
fn top_submitters(
    ctx: &QueryContext<'_>,
    filters: &MetricFilters,
    days: u32,
    (role, action): (&str, &str),
    statuses: &[&str],
) -> Result<MetricResult, MetricError> {
    let ids = ctx.require_identities("the submitters ranking")?;
    let query = status_count(action, statuses)
        .field(format!("u.identifier AS {role}"))
        .field("u.id AS id")
        .with_fragment(&people_join("i.submitted_by"))
        .table(format!("{} u", ids.table("upeople")))
        .condition("pup.upeople_id = u.id")
        .exclude("u.identifier", filters.bots())
        .within_days_of_latest(days, "issues", "submitted_on")
        .group_by("u.id")
        .order_by(format!("{action} DESC"))
        .order_by(role)
        .limit(filters.npeople());

    ranked_list(ctx, &query, filters, &["id", role, action])
}

/// People ranked by the review events they authored.
fn top_reviewers(ctx: &QueryContext<'_>, filters: &MetricFilters, days: u32) -> Result<MetricResult, MetricError> {
    let ids = ctx.require_identities("the reviewers ranking")?;
    let query = SqlQuery::new("c.changed_on")
        .field("u.id AS id")
        .field("u.identifier AS reviewers")
        .field("COUNT(DISTINCT(c.id)) AS reviewed")
        .table("changes c")
        .with_fragment(&people_join("c.changed_by"))
        .table(format!("{} u", ids.table("upeople")))
        .condition("pup.upeople_id = u.id")
        .exclude("u.identifier", filters.bots())
        .within_days_of_latest(days, "changes", "changed_on")
        .group_by("u.id")
        .order_by("reviewed DESC")
        .order_by("reviewers")
        .limit(filters.npeople());

    ranked_list(ctx, &query, filters, &["id", "reviewers", "reviewed"])
}

/// Reviews still open: submitted minus merged minus abandoned, bucket by bucket.
#[derive(Debug)]
pub struct Pending {
    def: MetricDef,
}

pub static PENDING: Pending = Pending {
    def: metric_def!(Scr, "pending", "Pending reviews", "Number of pending review processes"),
};

impl Pending {
    fn combine(
        &self,
        submitted: &MetricResult,
        merged: &MetricResult,
        abandoned: &MetricResult,
        zero: &MetricValue,
    ) -> Result<MetricResult, MetricError> {
        let inputs = [(submitted, "submitted"), (merged, "merged"), (abandoned, "abandoned")];

        if submitted.names().is_none() {
            let values = inputs.map(|(result, key)| result.get(key).cloned().unwrap_or_else(|| zero.clone()));
            let pending = subtract(self.def.id, &values[0], &[&values[1], &values[2]])?;
            return Ok(MetricResult::new().with(self.def.id, pending));
        }

        // align the three grouped inputs by item before subtracting
        let names: BTreeSet<String> = inputs
            .iter()
            .flat_map(|(result, _)| result.names().unwrap_or_default())
            .map(str::to_string)
            .collect();
        let values = inputs.map(|(result, key)| MetricValue::List(by_name(result, key, &names, zero)));
        let pending = subtract(self.def.id, &values[0], &[&values[1], &values[2]])?;

        Ok(MetricResult::new()
            .with(NAME_KEY, names.iter().map(|name| MetricValue::from(name.as_str())).collect::<Vec<_>>())
            .with(self.def.id, pending))
    }
}

impl Metric for Pending {
    fn def(&self) -> &MetricDef {
        &self.def
    }

    fn agg(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        let submitted = SUBMITTED.agg(ctx, filters)?;
        let merged = MERGED.agg(ctx, filters)?;
        let abandoned = ABANDONED.agg(ctx, filters)?;
        self.combine(&submitted, &merged, &abandoned, &MetricValue::Int(0))
    }

    fn ts(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        let submitted = SUBMITTED.ts(ctx, filters)?;
        let merged = MERGED.ts(ctx, filters)?;
        let abandoned = ABANDONED.ts(ctx, filters)?;

        let period = filters.period().as_str();
        let zero = MetricValue::zeros(filters.period().bucket_count(filters.range()));
        let mut result = self.combine(&submitted, &merged, &abandoned, &zero)?;
        if let Some(labels) = submitted.get(period) {
            result.set(period, labels.clone());
        }
        Ok(result)
    }
}

fn by_name(result: &MetricResult, key: &str, names: &BTreeSet<String>, zero: &MetricValue) -> Vec<MetricValue> {
    let own_names = result.names().unwrap_or_default();
    let values = result.get(key).and_then(MetricValue::as_list).unwrap_or_default();
    let lookup: BTreeMap<&str, &MetricValue> = own_names.into_iter().zip(values).collect();

    names
        .iter()
        .map(|name| lookup.get(name.as_str()).map_or_else(|| zero.clone(), |value| (*value).clone()))
        .collect()
}

/// Pointwise `minuend - subtrahends`, recursing into series.
///
/// Series must have identical lengths; they are never truncated to fit.
pub(crate) fn subtract(metric: &'static str, minuend: &MetricValue, subtrahends: &[&MetricValue]) -> Result<MetricValue, MetricError> {
    let MetricValue::List(values) = minuend else {
        return Ok(subtrahends.iter().fold(minuend.clone(), |acc, value| acc.minus(value)));
    };

    let mut remaining = values.clone();
    for subtrahend in subtrahends {
        let other = subtrahend.as_list().unwrap_or_default();
        if other.len() != remaining.len() {
            return Err(MetricError::AlignmentMismatch {
                metric,
                expected: remaining.len(),
                actual: other.len(),
            });
        }

        remaining = remaining
            .iter()
            .zip(other)
            .map(|(left, right)| subtract(metric, left, &[right]))
            .collect::<Result<_, _>>()?;
    }

    Ok(MetricValue::List(remaining))
}

/// Days from submission to merge: median and average.
#[derive(Debug)]
pub struct ReviewTime {
    def: MetricDef,
}

pub static REVIEW_TIME: ReviewTime = ReviewTime {
    def: metric_def!(Scr, "review_time", "Review Time", "Days from the submission of a review to its merge"),
};

impl ReviewTime {
    fn rows(ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<(QueryResult, bool), MetricError> {
        let frag = fragment(DataSource::Scr, filters.dimension(), ctx.identities())?;
        let query = changes("julianday(c.changed_on) - julianday(i.submitted_on) AS revtime".into())
            .field(format!("{} AS month", Period::Month.bucket_sql("c.changed_on")))
            .condition("c.field = 'status'")
            .condition("c.new_value = 'MERGED'")
            .with_fragment(&frag);

        let rows = ctx.execute(&query.raw(filters.range()))?;
        Ok((rows, query.item_field().is_some()))
    }
}

impl Metric for ReviewTime {
    fn def(&self) -> &MetricDef {
        &self.def
    }

    fn agg(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        let (rows, grouped) = Self::rows(ctx, filters)?;

        if !grouped {
            let (median, avg) = median_and_avg(review_times(&rows, |_, _| true));
            return Ok(MetricResult::new().with(MEDIAN_KEY, median).with(AVG_KEY, avg));
        }

        let by_item = group_review_times(&rows, NAME_KEY);
        let mut names = Vec::with_capacity(by_item.len());
        let mut medians = Vec::with_capacity(by_item.len());
        let mut avgs = Vec::with_capacity(by_item.len());
        for (name, times) in by_item {
            let (median, avg) = median_and_avg(times);
            names.push(MetricValue::from(name));
            medians.push(median);
            avgs.push(avg);
        }

        Ok(MetricResult::new()
            .with(NAME_KEY, names)
            .with(MEDIAN_KEY, medians)
            .with(AVG_KEY, avgs))
    }

    fn ts(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        if filters.period() != Period::Month {
            return Err(MetricError::unsupported(self.def.id, "review time series are only computed per month"));
        }

        let (rows, grouped) = Self::rows(ctx, filters)?;
        let labels = Period::Month.buckets(filters.range());
        let label_values = labels.iter().map(|label| MetricValue::from(label.as_str())).collect::<Vec<_>>();

        let series = |rows: &QueryResult, name: Option<&str>| {
            let mut medians = Vec::with_capacity(labels.len());
            let mut avgs = Vec::with_capacity(labels.len());
            for label in &labels {
                let times = review_times(rows, |row_label, row_name| {
                    row_label == Some(label.as_str()) && (name.is_none() || row_name == name)
                });
                if times.is_empty() {
                    medians.push(MetricValue::Int(0));
                    avgs.push(MetricValue::Int(0));
                } else {
                    let (median, avg) = median_and_avg(times);
                    medians.push(median);
                    avgs.push(avg);
                }
            }
            (medians, avgs)
        };

        let mut result = MetricResult::new().with("month", label_values);
        if grouped {
            let names = group_review_times(&rows, NAME_KEY).into_keys().collect::<Vec<_>>();
            let (medians, avgs): (Vec<_>, Vec<_>) = names
                .iter()
                .map(|name| {
                    let (medians, avgs) = series(&rows, Some(name.as_str()));
                    (MetricValue::List(medians), MetricValue::List(avgs))
                })
                .unzip();
            result.set(NAME_KEY, names.into_iter().map(MetricValue::from).collect::<Vec<_>>());
            result.set(MEDIAN_KEY, medians);
            result.set(AVG_KEY, avgs);
        } else {
            let (medians, avgs) = series(&rows, None);
            result.set(MEDIAN_KEY, medians);
            result.set(AVG_KEY, avgs);
        }

        Ok(result)
    }
}

/// Review times of the rows accepted by `keep(month, name)`.
fn review_times(rows: &QueryResult, keep: impl Fn(Option<&str>, Option<&str>) -> bool) -> Vec<f64> {
    let revtime = rows.column_index("revtime");
    let month = rows.column_index("month");
    let name = rows.column_index(NAME_KEY);

    rows.rows()
        .iter()
        .filter(|row| {
            let text = |index: Option<usize>| index.and_then(|index| row.get(index)).and_then(SqlValue::as_text);
            let (month, name) = (text(month), text(name));
            keep(month.as_deref(), name.as_deref())
        })
        .filter_map(|row| revtime.and_then(|index| row.get(index)).and_then(SqlValue::as_f64))
        .collect()
}

fn group_review_times(rows: &QueryResult, key: &str) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let (Some(revtime), Some(key)) = (rows.column_index("revtime"), rows.column_index(key)) else {
        return groups;
    };

    for row in rows.rows() {
        let group = row.get(key).and_then(SqlValue::as_text);
        let time = row.get(revtime).and_then(SqlValue::as_f64);
        if let (Some(group), Some(time)) = (group, time) {
            groups.entry(group).or_default().push(time);
        }
    }
    groups
}

#[expect(clippy::cast_precision_loss, reason = "review counts are far below 2^52")]
fn median_and_avg(mut times: Vec<f64>) -> (MetricValue, MetricValue) {
    if times.is_empty() {
        return (MetricValue::Null, MetricValue::Null);
    }

    times.sort_by(f64::total_cmp);
    let mid = times.len() / 2;
    let median = if times.len() % 2 == 0 {
        f64::midpoint(times[mid - 1], times[mid])
    } else {
        times[mid]
    };
    let avg = times.iter().sum::<f64>() / times.len() as f64;

    (MetricValue::Float(round2(median)), MetricValue::Float(round2(avg)))
}

pub static PROFILE: DataSourceProfile = DataSourceProfile {
    metrics: &[
        &SUBMITTED,
        &OPENED,
        &CLOSED,
        &MERGED,
        &ABANDONED,
        &NEW,
        &IN_PROGRESS,
        &PENDING,
        &REVIEW_TIME,
        &REPOSITORIES,
        &VERIFIED,
        &APPROVED,
        &CODE_REVIEW,
        &SENT,
        &WAITING_FOR_REVIEWER,
        &WAITING_FOR_SUBMITTER,
        &REVIEWS_WAITING_FOR_REVIEWER,
        &REVIEWS_WAITING_FOR_SUBMITTER,
        &SUBMITTERS,
        &REVIEWERS,
        &MERGERS,
        &CLOSERS,
        &COMPANIES,
        &COUNTRIES,
        &DOMAINS,
        &PEOPLE,
        &MERGED_CHANGES,
        &ABANDONED_CHANGES,
        &NEW_CHANGES,
    ],
    core_ts: &[
        "submitted",
        "opened",
        "closed",
        "merged",
        "abandoned",
        "new",
        "pending",
        "review_time",
        "repositories",
        "verified",
        "codereview",
        "sent",
        "WaitingForReviewer",
        "WaitingForSubmitter",
        "submitters",
        "reviewers",
    ],
    core_agg: &[
        "submitted",
        "opened",
        "closed",
        "merged",
        "abandoned",
        "new",
        "inprogress",
        "pending",
        "review_time",
        "repositories",
        "verified",
        "approved",
        "codereview",
        "sent",
        "WaitingForReviewer",
        "WaitingForSubmitter",
        "submitters",
        "reviewers",
    ],
    core_trends: &["submitted", "merged", "pending", "abandoned", "closed", "submitters"],
    core_reports: &["companies", "countries", "domains"],
    not_under_filters: &[
        "verified",
        "codereview",
        "sent",
        "WaitingForReviewer",
        "WaitingForSubmitter",
        "approved",
    ],
    change_series: &["merged_changes", "abandoned_changes", "new_changes"],
    top_roles: &[
        TopRole {
            role: "reviewers",
            metric: "reviewers",
            windows: STANDARD_WINDOWS,
        },
        TopRole {
            role: "openers",
            metric: "submitters",
            windows: STANDARD_WINDOWS,
        },
        TopRole {
            role: "mergers",
            metric: "mergers",
            windows: STANDARD_WINDOWS,
        },
    ],
    catalogue_metric: Some("submitted"),
    summary_metrics: &["submitted", "review_time"],
    person_metrics: &["submitted"],
    activity: Some(("issues i", "i.submitted_on")),
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DateRange, Dimension, DimensionFilter};
    use crate::query::testing::ScriptedExecutor;
    use chrono::NaiveDate;
    use serde_json::json;

    fn first_quarter() -> MetricFilters {
        MetricFilters::new(
            Period::Month,
            DateRange::new(
                NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2014, 4, 1).unwrap(),
            )
            .unwrap(),
        )
    }

    fn status_series(executor: ScriptedExecutor, id: &str, status: &str, counts: [i64; 3]) -> ScriptedExecutor {
        let rows = ["2014-01", "2014-02", "2014-03"]
            .iter()
            .zip(counts)
            .map(|(month, count)| vec![SqlValue::from(*month), SqlValue::Integer(count)])
            .collect();
        executor.on(&format!("AS {id} FROM issues i WHERE {status}"), &["month", id], rows)
    }

    #[test]
    fn test_status_queries() {
        let range = first_quarter();
        insta::assert_snapshot!(
            status_count("closed", &["MERGED", "ABANDONED"]).global(range.range()),
            @"SELECT COUNT(DISTINCT(i.id)) AS closed FROM issues i WHERE i.status IN ('MERGED', 'ABANDONED') AND i.submitted_on >= '2014-01-01' AND i.submitted_on < '2014-04-01'"
        );
    }

    #[test]
    fn test_pending_is_submitted_minus_merged_minus_abandoned() {
        let executor = ScriptedExecutor::new();
        let executor = status_series(executor, "merged", "i.status = 'MERGED'", [2, 1, 0]);
        let executor = status_series(executor, "abandoned", "i.status = 'ABANDONED'", [1, 0, 0]);
        let executor = executor.on(
            "AS submitted FROM issues i WHERE i.submitted_on",
            &["month", "submitted"],
            vec![
                vec![SqlValue::from("2014-01"), SqlValue::Integer(5)],
                vec![SqlValue::from("2014-03"), SqlValue::Integer(4)],
            ],
        );
        let ctx = QueryContext::new(&executor, None);

        let pending = PENDING.ts(&ctx, &first_quarter()).unwrap();
        assert_eq!(
            pending.to_json(),
            json!({"month": ["2014-01", "2014-02", "2014-03"], "pending": [2, -1, 4]})
        );

        let submitted = SUBMITTED.ts(&ctx, &first_quarter()).unwrap();
        let merged = MERGED.ts(&ctx, &first_quarter()).unwrap();
        let abandoned = ABANDONED.ts(&ctx, &first_quarter()).unwrap();
        let series = |result: &MetricResult, key: &str| result.get(key).and_then(MetricValue::as_list).unwrap().to_vec();
        for (i, value) in series(&pending, "pending").iter().enumerate() {
            let expected = series(&submitted, "submitted")[i]
                .minus(&series(&merged, "merged")[i])
                .minus(&series(&abandoned, "abandoned")[i]);
            assert_eq!(*value, expected);
        }
    }

    #[test]
    fn test_pending_aggregate() {
        let executor = ScriptedExecutor::new()
            .on("i.status = 'MERGED'", &["merged"], vec![vec![SqlValue::Integer(3)]])
            .on("i.status = 'ABANDONED'", &["abandoned"], vec![vec![SqlValue::Integer(1)]])
            .on("AS submitted", &["submitted"], vec![vec![SqlValue::Integer(10)]]);
        let ctx = QueryContext::new(&executor, None);

        assert_eq!(PENDING.agg(&ctx, &first_quarter()).unwrap().to_json(), json!({"pending": 6}));
    }

    #[test]
    fn test_pending_aligns_items() {
        let executor = ScriptedExecutor::new()
            .on(
                "i.status = 'MERGED'",
                &["name", "merged"],
                vec![vec![SqlValue::from("repoB"), SqlValue::Integer(1)]],
            )
            .on("AS submitted", &["name", "submitted"], vec![
                vec![SqlValue::from("repoA"), SqlValue::Integer(4)],
                vec![SqlValue::from("repoB"), SqlValue::Integer(2)],
            ]);
        let ctx = QueryContext::new(&executor, None);
        let filters = first_quarter().with_dimension(Some(DimensionFilter::all_items(Dimension::Repository)));

        let pending = PENDING.agg(&ctx, &filters).unwrap();
        assert_eq!(pending.to_json(), json!({"name": ["repoA", "repoB"], "pending": [4, 1]}));
    }

    #[test]
    fn test_subtract_rejects_unaligned_series() {
        let three = MetricValue::zeros(3);
        let two = MetricValue::zeros(2);
        let err = subtract("pending", &three, &[&two]).unwrap_err();
        assert!(matches!(
            err,
            MetricError::AlignmentMismatch {
                metric: "pending",
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_review_time_aggregate() {
        let executor = ScriptedExecutor::new().on(
            "AS revtime",
            &["revtime", "month"],
            vec![
                vec![SqlValue::Real(1.0), SqlValue::from("2014-01")],
                vec![SqlValue::Real(2.0), SqlValue::from("2014-01")],
                vec![SqlValue::Real(6.5), SqlValue::from("2014-02")],
            ],
        );
        let ctx = QueryContext::new(&executor, None);

        let result = REVIEW_TIME.agg(&ctx, &first_quarter()).unwrap();
        assert_eq!(result.to_json(), json!({"review_time_days_median": 2.0, "review_time_days_avg": 3.17}));

        let series = REVIEW_TIME.ts(&ctx, &first_quarter()).unwrap();
        assert_eq!(
            series.to_json(),
            json!({
                "month": ["2014-01", "2014-02", "2014-03"],
                "review_time_days_median": [1.5, 6.5, 0],
                "review_time_days_avg": [1.5, 6.5, 0],
            })
        );
    }

    #[test]
    fn test_review_time_series_per_person() {
        let executor = ScriptedExecutor::new().on(
            "AS revtime",
            &["revtime", "month", "name"],
            vec![
                vec![SqlValue::Real(2.0), SqlValue::from("2014-01"), SqlValue::Integer(100)],
                vec![SqlValue::Real(4.0), SqlValue::from("2014-02"), SqlValue::Integer(100)],
                vec![SqlValue::Real(1.0), SqlValue::from("2014-01"), SqlValue::Integer(101)],
            ],
        );
        let ctx = QueryContext::new(&executor, None);
        let filters = first_quarter().with_dimension(Some(DimensionFilter::all_items(Dimension::People)));

        let series = REVIEW_TIME.ts(&ctx, &filters).unwrap();
        assert_eq!(series.to_json()["name"], json!(["100", "101"]));
        assert_eq!(series.to_json()["review_time_days_median"], json!([[2.0, 4.0, 0], [1.0, 0, 0]]));

        let aggregate = REVIEW_TIME.agg(&ctx, &filters).unwrap();
        assert_eq!(aggregate.to_json()["review_time_days_median"], json!([3.0, 1.0]));
    }

    #[test]
    fn test_review_time_without_merges_is_null() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let result = REVIEW_TIME.agg(&ctx, &first_quarter()).unwrap();
        assert_eq!(result.to_json(), json!({"review_time_days_median": null, "review_time_days_avg": null}));
    }

    #[test]
    fn test_review_time_series_needs_months() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let filters = MetricFilters::new(Period::Week, *first_quarter().range());
        assert!(matches!(REVIEW_TIME.ts(&ctx, &filters), Err(MetricError::Unsupported { .. })));
    }

    #[test]
    fn test_inert_counts_keep_their_lists() {
        let executor = ScriptedExecutor::new();
        let ids = crate::query::IdentitiesDb::default();
        let ctx = QueryContext::new(&executor, Some(&ids));
        let filters = first_quarter().with_bots(["bot".to_string()]);

        assert!(matches!(MERGERS.agg(&ctx, &filters), Err(MetricError::Unsupported { .. })));
        let list = MERGERS.list(&ctx, &filters, 31).unwrap();
        assert!(list.contains_key("mergers"));
        assert!(list.contains_key("merged"));

        let sql = executor.executed().remove(0);
        assert!(sql.contains("i.status = 'MERGED'"));
        assert!(sql.contains("u.identifier NOT IN ('bot')"));
        assert!(sql.contains("julianday((SELECT MAX(submitted_on) FROM issues)) - julianday(i.submitted_on) < 31"));
        assert!(sql.ends_with("ORDER BY merged DESC, mergers LIMIT 10"));
    }

    #[test]
    fn test_domain_filter_is_unsupported() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let filters = first_quarter().with_dimension(Some(DimensionFilter::scoped(Dimension::Domain, "example.com")));
        assert!(matches!(
            SUBMITTED.agg(&ctx, &filters),
            Err(MetricError::UnsupportedDimension { .. })
        ));
    }
}
