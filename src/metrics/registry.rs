use super::completion::grouped_aggregate;
use super::{DataSource, ItemCatalogue, Metric, MetricError, MetricResult, MetricValue, downloads, releases, scm, scr};
use crate::filters::{Dimension, DimensionFilter, MetricFilters};
use crate::query::{QueryContext, SqlQuery, fragment};

const LOG_TARGET: &str = "  registry";

/// A window of a top-N ranking: the last `days` before the newest activity, or the
/// whole range when `days` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopWindow {
    pub days: u32,
    pub suffix: &'static str,
}

impl TopWindow {
    /// Key of the ranking of `role` over this window in a top report.
    #[must_use]
    pub fn key(&self, role: &str) -> String {
        if self.suffix.is_empty() {
            format!("{role}.")
        } else {
            format!("{role}.{}", self.suffix)
        }
    }
}

/// All-time, last month and last year.
pub const STANDARD_WINDOWS: &[TopWindow] = &[
    TopWindow { days: 0, suffix: "" },
    TopWindow {
        days: 31,
        suffix: "last month",
    },
    TopWindow {
        days: 365,
        suffix: "last year",
    },
];

pub const ALL_TIME_WINDOW: &[TopWindow] = &[TopWindow { days: 0, suffix: "" }];

/// A ranking published in the top report, computed by the list of `metric`.
#[derive(Debug, Clone, Copy)]
pub struct TopRole {
    pub role: &'static str,
    pub metric: &'static str,
    pub windows: &'static [TopWindow],
}

/// What a data source offers and which of it reports use by default.
#[derive(Debug)]
pub struct DataSourceProfile {
    /// Every metric of the data source, in report order.
    pub metrics: &'static [&'static dyn Metric],
    pub core_ts: &'static [&'static str],
    pub core_agg: &'static [&'static str],
    pub core_trends: &'static [&'static str],

    /// Optional metrics added to unfiltered reports when enabled in the configuration.
    pub core_reports: &'static [&'static str],

    /// Metrics dropped from reports scoped by a dimension filter.
    pub not_under_filters: &'static [&'static str],

    /// Series added to unfiltered evolutionary reports.
    pub change_series: &'static [&'static str],
    pub top_roles: &'static [TopRole],

    /// Count used to enumerate and rank the items of a dimension.
    pub catalogue_metric: Option<&'static str>,

    /// Aggregates listed for every item in the summary of a dimension.
    pub summary_metrics: &'static [&'static str],
    pub person_metrics: &'static [&'static str],

    /// Table and date column the first and last activity dates are read from.
    pub activity: Option<(&'static str, &'static str)>,
}

/// The metrics of one data source, addressable by id.
#[derive(Debug, Clone, Copy)]
pub struct MetricRegistry {
    data_source: DataSource,
    profile: &'static DataSourceProfile,
}

impl MetricRegistry {
    #[must_use]
    pub fn new(data_source: DataSource) -> Self {
        let profile = match data_source {
            DataSource::Scm => &scm::PROFILE,
            DataSource::Scr => &scr::PROFILE,
            DataSource::Releases => &releases::PROFILE,
            DataSource::Downloads => &downloads::PROFILE,
        };

        Self { data_source, profile }
    }

    #[must_use]
    pub const fn data_source(&self) -> DataSource {
        self.data_source
    }

    #[must_use]
    pub const fn profile(&self) -> &'static DataSourceProfile {
        self.profile
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static dyn Metric> {
        self.profile.metrics.iter().copied()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'static dyn Metric> {
        self.iter().find(|metric| metric.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The registered metrics among `ids`, in registry order.
    ///
    /// Ids the registry does not know are skipped.
    #[must_use]
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&'static dyn Metric> {
        for id in ids {
            if !self.contains(id.as_ref()) {
                log::debug!(target: LOG_TARGET, "Ignoring unknown {} metric '{}'", self.data_source, id.as_ref());
            }
        }

        self.iter()
            .filter(|metric| ids.iter().any(|id| id.as_ref() == metric.id()))
            .collect()
    }

    /// Whether the data source can scope its metrics by `dimension`.
    #[must_use]
    pub const fn supports(&self, dimension: Dimension) -> bool {
        crate::query::supports(self.data_source, dimension)
    }

    /// Every item of `dimension` with activity in the filter window, most active first.
    pub fn catalogue(
        &self,
        ctx: &QueryContext<'_>,
        filters: &MetricFilters,
        dimension: Dimension,
    ) -> Result<ItemCatalogue, MetricError> {
        let Some(id) = self.profile.catalogue_metric else {
            return Err(MetricError::UnsupportedDimension {
                data_source: self.data_source,
                dimension,
            });
        };
        let metric = self
            .get(id)
            .ok_or_else(|| MetricError::Configuration(format!("catalogue metric '{id}' is not registered")))?;

        let counts = metric.agg(ctx, &filters.with_dimension(Some(DimensionFilter::all_items(dimension))))?;
        let catalogue = ItemCatalogue::ranked(dimension, &counts, id);
        log::info!(target: LOG_TARGET, "Found {} {} items in {}", catalogue.len(), dimension, self.data_source);
        Ok(catalogue)
    }

    /// Dates of the first and last activity in the filter window.
    ///
    /// In all-items mode the dates are grouped per item.
    pub fn activity_dates(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError> {
        let Some((table, column)) = self.profile.activity else {
            return Err(MetricError::unsupported("activity_dates", format!("{} has no activity dates", self.data_source)));
        };

        let frag = fragment(self.data_source, filters.dimension(), ctx.identities())?;
        let query = SqlQuery::new(column)
            .field(format!("strftime('%Y-%m-%d', MIN({column})) AS first_date"))
            .field(format!("strftime('%Y-%m-%d', MAX({column})) AS last_date"))
            .table(table)
            .with_fragment(&frag);

        let rows = ctx.execute(&query.global(filters.range()))?;
        if query.item_field().is_some() {
            let mut result = grouped_aggregate(&rows, &[]);
            for key in ["first_date", "last_date"] {
                let values = rows
                    .column(key)
                    .map(|values| values.map(MetricValue::from).collect::<Vec<_>>())
                    .unwrap_or_default();
                result.set(key, values);
            }
            return Ok(result);
        }

        let date = |key: &str| rows.scalar(key).map_or(MetricValue::Null, MetricValue::from);
        Ok(MetricResult::new()
            .with("first_date", date("first_date"))
            .with("last_date", date("last_date")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DateRange, Period};
    use crate::query::SqlValue;
    use crate::query::testing::ScriptedExecutor;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    fn filters() -> MetricFilters {
        MetricFilters::new(
            Period::Month,
            DateRange::new(
                NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_profiles_reference_registered_metrics() {
        for ds in DataSource::iter() {
            let registry = MetricRegistry::new(ds);
            let profile = registry.profile();

            let mut seen = HashSet::new();
            for metric in registry.iter() {
                assert_eq!(metric.def().data_source, ds, "{}", metric.id());
                assert!(seen.insert(metric.id()), "duplicate metric id '{}'", metric.id());
            }

            let sets = [
                profile.core_ts,
                profile.core_agg,
                profile.core_trends,
                profile.core_reports,
                profile.not_under_filters,
                profile.change_series,
                profile.summary_metrics,
                profile.person_metrics,
            ];
            for id in sets.iter().flat_map(|set| set.iter()) {
                assert!(registry.contains(id), "{ds} does not register '{id}'");
            }
            for role in profile.top_roles {
                assert!(registry.contains(role.metric), "{ds} does not register '{}'", role.metric);
            }
            if let Some(id) = profile.catalogue_metric {
                assert!(registry.contains(id));
            }
        }
    }

    #[test]
    fn test_select_is_an_intersection_in_registry_order() {
        let registry = MetricRegistry::new(DataSource::Scm);
        let selected = registry.select(&["files", "nope", "ncommits"]);
        let ids: Vec<_> = selected.iter().map(|metric| metric.id()).collect();
        assert_eq!(ids, ["ncommits", "files"]);
    }

    #[test]
    fn test_top_window_keys() {
        let keys: Vec<_> = STANDARD_WINDOWS.iter().map(|window| window.key("authors")).collect();
        assert_eq!(keys, ["authors.", "authors.last month", "authors.last year"]);
    }

    #[test]
    fn test_catalogue_ranks_items() {
        let executor = ScriptedExecutor::new().on(
            "t.url AS name",
            &["name", "submitted"],
            vec![
                vec![SqlValue::from("repoB"), SqlValue::Integer(1)],
                vec![SqlValue::from("repoA"), SqlValue::Integer(7)],
            ],
        );
        let ctx = QueryContext::new(&executor, None);

        let catalogue = MetricRegistry::new(DataSource::Scr)
            .catalogue(&ctx, &filters(), Dimension::Repository)
            .unwrap();
        assert_eq!(catalogue.items(), ["repoA", "repoB"]);
    }

    #[test]
    fn test_catalogue_of_unsupported_source() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let err = MetricRegistry::new(DataSource::Downloads)
            .catalogue(&ctx, &filters(), Dimension::Repository)
            .unwrap_err();
        assert!(matches!(err, MetricError::UnsupportedDimension { .. }));
    }

    #[test]
    fn test_activity_dates() {
        let executor = ScriptedExecutor::new().on(
            "AS first_date",
            &["first_date", "last_date"],
            vec![vec![SqlValue::from("2014-01-03"), SqlValue::from("2014-12-30")]],
        );
        let ctx = QueryContext::new(&executor, None);

        let dates = MetricRegistry::new(DataSource::Scm).activity_dates(&ctx, &filters()).unwrap();
        assert_eq!(dates.to_json(), json!({"first_date": "2014-01-03", "last_date": "2014-12-30"}));
        assert!(executor.executed()[0].contains("MIN(s.date)"));
    }
}
