use crate::filters::{MetricFilters, Period};
use crate::metrics::{DataSource, MetricError, MetricResult, ranked_list};
use crate::query::{QueryContext, SqlQuery, company_join, people_join};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "  quarters";

/// Number of people and organizations listed for each quarter.
pub const QUARTER_LIMIT: u32 = 25;

const PEOPLE_COLUMNS: &[&str] = &["id", "name", "total"];
const ORGANIZATION_COLUMNS: &[&str] = &["name", "total"];

/// Review submitters and their organizations, over the whole window and per quarter.
///
/// People are ranked by the reviews they submitted, bots excluded. Organizations are
/// ranked by the reviews their members submitted while affiliated with them. The
/// quarterly rankings keep the first [`QUARTER_LIMIT`] entries and are keyed by the
/// quarter label (`2014-Q1`), each quarter clipped to the reporting window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuartersReport {
    people: MetricResult,
    organizations: MetricResult,
    people_quarters: BTreeMap<String, MetricResult>,
    organizations_quarters: BTreeMap<String, MetricResult>,
}

impl QuartersReport {
    pub fn build(ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<Self, MetricError> {
        let mut report = Self {
            people: ranked_list(ctx, &people_query(ctx, filters)?, filters, PEOPLE_COLUMNS)?,
            organizations: ranked_list(ctx, &organizations_query(ctx)?, filters, ORGANIZATION_COLUMNS)?,
            ..Self::default()
        };

        for (label, window) in Period::Quarter.bucket_ranges(filters.range()) {
            let quarter = filters.with_range(window);

            let people = people_query(ctx, &quarter)?.limit(QUARTER_LIMIT);
            let _ = report
                .people_quarters
                .insert(label.clone(), ranked_list(ctx, &people, &quarter, PEOPLE_COLUMNS)?);

            let organizations = organizations_query(ctx)?.limit(QUARTER_LIMIT);
            let _ = report
                .organizations_quarters
                .insert(label, ranked_list(ctx, &organizations, &quarter, ORGANIZATION_COLUMNS)?);
        }

        log::debug!(target: LOG_TARGET, "Ranked people and organizations over {} quarters", report.people_quarters.len());
        Ok(report)
    }

    #[must_use]
    pub const fn people(&self) -> &MetricResult {
        &self.people
    }

    #[must_use]
    pub const fn organizations(&self) -> &MetricResult {
        &self.organizations
    }

    pub fn people_quarters(&self) -> impl Iterator<Item = (&str, &MetricResult)> {
        self.people_quarters.iter().map(|(label, ranking)| (label.as_str(), ranking))
    }

    pub fn organizations_quarters(&self) -> impl Iterator<Item = (&str, &MetricResult)> {
        self.organizations_quarters.iter().map(|(label, ranking)| (label.as_str(), ranking))
    }

    /// File name and content of every file of the report.
    #[must_use]
    pub fn files(&self, data_source: DataSource) -> Vec<(String, serde_json::Value)> {
        vec![
            (format!("{data_source}-people-all.json"), self.people.to_json()),
            (format!("{data_source}-organizations-all.json"), self.organizations.to_json()),
            (format!("{data_source}-people-quarters.json"), quarters_json(&self.people_quarters)),
            (format!("{data_source}-organizations-quarters.json"), quarters_json(&self.organizations_quarters)),
        ]
    }
}

fn quarters_json(quarters: &BTreeMap<String, MetricResult>) -> serde_json::Value {
    serde_json::Value::Object(
        quarters
            .iter()
            .map(|(label, ranking)| (label.clone(), ranking.to_json()))
            .collect(),
    )
}

fn people_query(ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<SqlQuery, MetricError> {
    let ids = ctx.require_identities("the quarterly people ranking")?;
    Ok(SqlQuery::new("i.submitted_on")
        .field("u.id AS id")
        .field("u.identifier AS name")
        .field("COUNT(DISTINCT(i.id)) AS total")
        .table("issues i")
        .with_fragment(&people_join("i.submitted_by"))
        .table(format!("{} u", ids.table("upeople")))
        .condition("pup.upeople_id = u.id")
        .exclude("u.identifier", filters.bots())
        .group_by("u.id")
        .order_by("total DESC")
        .order_by("name"))
}

fn organizations_query(ctx: &QueryContext<'_>) -> Result<SqlQuery, MetricError> {
    let ids = ctx.require_identities("the quarterly organizations ranking")?;
    Ok(SqlQuery::new("i.submitted_on")
        .field("com.name AS name")
        .field("COUNT(DISTINCT(i.id)) AS total")
        .table("issues i")
        .with_fragment(&company_join(ids, "i.submitted_by", "i.submitted_on"))
        .group_by("com.id")
        .order_by("total DESC")
        .order_by("name"))
}
