use super::settings::ReportSettings;
use super::top::TopReport;
use super::writer::ReportKind;
use crate::Result;
use crate::filters::{DateRange, Dimension, DimensionFilter, MetricFilters};
use crate::metrics::{ItemCatalogue, Metric, MetricError, MetricRegistry, MetricResult, MetricValue, NAME_KEY};
use crate::query::QueryContext;

const LOG_TARGET: &str = " assembler";

/// Lengths, in days, of the windows trends are computed over.
pub const TREND_WINDOWS: [u32; 3] = [7, 30, 365];

/// Builds the reports of one data source.
///
/// Every report follows the same steps: select the metrics it shows, bind them to one
/// filter snapshot, evaluate them, reconcile grouped results against the item
/// catalogue and merge everything into a single result. A metric that fails is
/// logged and left out; a configuration error aborts a report scoped by a dimension.
#[derive(Debug)]
pub struct ReportAssembler<'a> {
    registry: MetricRegistry,
    ctx: QueryContext<'a>,
    settings: ReportSettings,
}

impl<'a> ReportAssembler<'a> {
    #[must_use]
    pub const fn new(registry: MetricRegistry, ctx: QueryContext<'a>, settings: ReportSettings) -> Self {
        Self { registry, ctx, settings }
    }

    #[must_use]
    pub const fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn context(&self) -> &QueryContext<'a> {
        &self.ctx
    }

    #[must_use]
    pub const fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Metrics shown by a report of `kind`, in registry order.
    #[must_use]
    pub fn select(&self, kind: ReportKind, dimension: Option<&DimensionFilter>) -> Vec<&'static dyn Metric> {
        let profile = self.registry.profile();
        let (core, configured) = match kind {
            ReportKind::Evolutionary => (profile.core_ts, self.settings.metrics_ts.as_ref()),
            ReportKind::Static => (profile.core_agg, self.settings.metrics_agg.as_ref()),
        };

        let mut ids = configured.map_or_else(|| to_ids(core), Clone::clone);
        if dimension.is_some() {
            ids.retain(|id| !profile.not_under_filters.contains(&id.as_str()));
        } else {
            ids.extend(
                profile
                    .core_reports
                    .iter()
                    .filter(|id| self.settings.reports.iter().any(|enabled| enabled.as_str() == **id))
                    .map(ToString::to_string),
            );
        }

        self.registry.select(&ids)
    }

    /// The filter snapshot shared by every metric of a report, with the configured
    /// window of the data source applied.
    pub fn bind(&self, base: &MetricFilters) -> Result<MetricFilters> {
        let range = base.range();
        let start = self.settings.start_date.unwrap_or_else(|| range.start());
        let end = self.settings.end_date.unwrap_or_else(|| range.end());

        if start == range.start() && end == range.end() {
            return Ok(base.clone());
        }
        Ok(base.with_range(DateRange::new(start, end)?))
    }

    /// Series of the report metrics, one value per period bucket.
    ///
    /// Unfiltered reports also carry the change series of the data source. In all-items
    /// mode every series is aligned on `catalogue`, loaded when not given.
    pub fn evolutionary(&self, filters: &MetricFilters, catalogue: Option<&ItemCatalogue>) -> Result<MetricResult> {
        let mut metrics = self.select(ReportKind::Evolutionary, filters.dimension());
        if filters.dimension().is_none() {
            metrics.extend(self.registry.select(self.registry.profile().change_series));
        }

        self.grouped(ReportKind::Evolutionary, &metrics, filters, catalogue)
    }

    /// Aggregates of the report metrics, with activity dates and trends.
    pub fn aggregate(&self, filters: &MetricFilters, catalogue: Option<&ItemCatalogue>) -> Result<MetricResult> {
        let metrics = self.select(ReportKind::Static, filters.dimension());
        let mut report = self.grouped(ReportKind::Static, &metrics, filters, catalogue)?;

        if !filters.is_all_items() {
            if self.registry.profile().activity.is_some()
                && let Some(dates) = absorb("activity_dates", filters, self.registry.activity_dates(&self.ctx, filters))?
            {
                report.merge(dates)?;
            }
            report.merge(self.trends(filters)?)?;
        }

        Ok(report)
    }

    /// Trends of the trend metrics over every window of [`TREND_WINDOWS`] ending at
    /// the end of the filter window.
    pub fn trends(&self, filters: &MetricFilters) -> Result<MetricResult> {
        let ids = self
            .settings
            .metrics_trends
            .clone()
            .unwrap_or_else(|| to_ids(self.registry.profile().core_trends));
        let metrics = self.registry.select(&ids);
        let end = filters.range().end();

        let mut report = MetricResult::new();
        for days in TREND_WINDOWS {
            for metric in &metrics {
                if let Some(result) = absorb(metric.id(), filters, metric.trends(&self.ctx, filters, end, days))? {
                    report.merge(result)?;
                }
            }
        }

        Ok(report)
    }

    /// Rankings of every role of the data source over each of its windows.
    pub fn top(&self, filters: &MetricFilters) -> Result<TopReport> {
        let mut top = TopReport::new();

        for role in self.registry.profile().top_roles {
            let Some(metric) = self.registry.get(role.metric) else {
                log::warn!(target: LOG_TARGET, "No metric '{}' ranks the {} role", role.metric, role.role);
                continue;
            };

            for window in role.windows {
                if let Some(ranking) = absorb(metric.id(), filters, metric.list(&self.ctx, filters, window.days))? {
                    top.insert(window.key(role.role), ranking);
                }
            }
        }

        Ok(top)
    }

    /// One row per catalogue item with the summary aggregates of the data source.
    ///
    /// Items without a value read as `NA`.
    pub fn summary(&self, filters: &MetricFilters, catalogue: &ItemCatalogue) -> Result<MetricResult> {
        let grouped = filters.with_dimension(Some(DimensionFilter::all_items(catalogue.dimension())));
        let metrics = self.registry.select(self.registry.profile().summary_metrics);
        self.evaluate(ReportKind::Static, &metrics, &grouped, Some(catalogue))
    }

    /// Evolutionary and static reports of the activity of one person.
    pub fn person(&self, filters: &MetricFilters, id: &str) -> Result<(MetricResult, MetricResult)> {
        let scoped = filters.with_dimension(Some(DimensionFilter::scoped(Dimension::People, id)));
        let metrics = self.registry.select(self.registry.profile().person_metrics);

        let evolutionary = self.evaluate(ReportKind::Evolutionary, &metrics, &scoped, None)?;
        let mut aggregate = self.evaluate(ReportKind::Static, &metrics, &scoped, None)?;
        if self.registry.profile().activity.is_some()
            && let Some(dates) = absorb("activity_dates", &scoped, self.registry.activity_dates(&self.ctx, &scoped))?
        {
            aggregate.merge(dates)?;
        }

        Ok((evolutionary, aggregate))
    }

    fn grouped(
        &self,
        kind: ReportKind,
        metrics: &[&'static dyn Metric],
        filters: &MetricFilters,
        catalogue: Option<&ItemCatalogue>,
    ) -> Result<MetricResult> {
        match (filters.dimension(), catalogue) {
            (Some(filter), None) if filter.is_all_items() => {
                let catalogue = self.registry.catalogue(&self.ctx, filters, filter.dimension())?;
                self.evaluate(kind, metrics, filters, Some(&catalogue))
            }
            _ => self.evaluate(kind, metrics, filters, catalogue),
        }
    }

    fn evaluate(
        &self,
        kind: ReportKind,
        metrics: &[&'static dyn Metric],
        filters: &MetricFilters,
        catalogue: Option<&ItemCatalogue>,
    ) -> Result<MetricResult> {
        let period = filters.period().as_str();
        let (fill, shared) = match kind {
            ReportKind::Evolutionary => (MetricValue::zeros(filters.period().bucket_count(filters.range())), vec![period]),
            ReportKind::Static => (MetricValue::na(), Vec::new()),
        };

        let mut report = MetricResult::new();
        if let Some(catalogue) = catalogue {
            report.set(
                NAME_KEY,
                catalogue.items().iter().map(|item| MetricValue::from(item.as_str())).collect::<Vec<_>>(),
            );
        }

        for metric in metrics {
            let result = match kind {
                ReportKind::Evolutionary => metric.ts(&self.ctx, filters),
                ReportKind::Static => metric.agg(&self.ctx, filters),
            };
            let result = match catalogue {
                Some(catalogue) => result.and_then(|result| result.reconcile(catalogue, &fill, &shared)),
                None => result,
            };

            if let Some(result) = absorb(metric.id(), filters, result)? {
                report.merge(result)?;
            }
        }

        log::debug!(target: LOG_TARGET, "Evaluated {} {} metrics of {}", metrics.len(), kind.as_str(), self.registry.data_source());
        Ok(report)
    }
}

fn to_ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Keep the result of a metric, or log why it contributes nothing.
///
/// Configuration errors under a dimension filter are returned, since the filter itself
/// cannot be applied and no other metric of the report can succeed.
fn absorb(id: &str, filters: &MetricFilters, result: Result<MetricResult, MetricError>) -> Result<Option<MetricResult>> {
    match result {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.is_fatal() && filters.dimension().is_some() => Err(err.into()),
        Err(err) => {
            log::warn!(target: LOG_TARGET, "Skipping metric '{id}': {err}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Period;
    use crate::metrics::DataSource;
    use crate::query::SqlValue;
    use crate::query::testing::ScriptedExecutor;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn january() -> MetricFilters {
        MetricFilters::new(Period::Month, DateRange::new(date(2014, 1, 1), date(2014, 2, 1)).unwrap())
    }

    fn ids(metrics: &[&'static dyn Metric]) -> Vec<&'static str> {
        metrics.iter().map(|metric| metric.id()).collect()
    }

    #[test]
    fn test_select_core_sets() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            reports: vec!["companies".to_string()],
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scm), ctx, settings);

        assert_eq!(
            ids(&assembler.select(ReportKind::Evolutionary, None)),
            ["ncommits", "authors", "committers", "repositories", "files", "companies"]
        );

        let filter = DimensionFilter::scoped(Dimension::Repository, "libfoo");
        assert!(!ids(&assembler.select(ReportKind::Static, Some(&filter))).contains(&"companies"));
    }

    #[test]
    fn test_select_excludes_patch_metrics_under_filters() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scr), ctx, ReportSettings::default());

        let filter = DimensionFilter::scoped(Dimension::Repository, "libfoo");
        let selected = ids(&assembler.select(ReportKind::Static, Some(&filter)));
        assert!(selected.contains(&"submitted"));
        assert!(selected.contains(&"review_time"));
        assert!(!selected.contains(&"verified"));
        assert!(!selected.contains(&"WaitingForReviewer"));
    }

    #[test]
    fn test_select_override() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            metrics_agg: Some(vec!["files".to_string(), "bogus".to_string(), "ncommits".to_string()]),
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scm), ctx, settings);
        assert_eq!(ids(&assembler.select(ReportKind::Static, None)), ["ncommits", "files"]);
    }

    #[test]
    fn test_bind_applies_window_override() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            start_date: Some(date(2013, 6, 1)),
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scm), ctx, settings);

        let bound = assembler.bind(&january()).unwrap();
        assert_eq!(bound.range().start(), date(2013, 6, 1));
        assert_eq!(bound.range().end(), date(2014, 2, 1));
        assert_eq!(bound.period(), Period::Month);
    }

    #[test]
    fn test_failing_metric_degrades_report() {
        let executor = ScriptedExecutor::new().on("COUNT(DISTINCT(s.id)) AS ncommits", &["month", "ncommits"], vec![vec![
            SqlValue::from("2014-01"),
            SqlValue::Integer(12),
        ]]);
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            metrics_ts: Some(vec!["ncommits".to_string(), "companies".to_string()]),
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scm), ctx, settings);

        // companies needs the identities database, which this context lacks
        let report = assembler.evolutionary(&january(), None).unwrap();
        assert_eq!(report.to_json(), json!({"month": ["2014-01"], "ncommits": [12]}));
    }

    #[test]
    fn test_configuration_error_aborts_filtered_report() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scm), ctx, ReportSettings::default());

        let filters = january().with_dimension(Some(DimensionFilter::scoped(Dimension::Company, "Acme")));
        let err = assembler.evolutionary(&filters, None).unwrap_err();
        assert!(err.to_string().contains("identities"));
    }

    #[test]
    fn test_top_without_identities_is_empty() {
        let executor = ScriptedExecutor::new();
        let ctx = QueryContext::new(&executor, None);
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scr), ctx, ReportSettings::default());

        let top = assembler.top(&january()).unwrap();
        assert_eq!(top.sections().count(), 0);
        assert!(top.people().is_empty());
    }

    #[test]
    fn test_unsupported_metric_is_skipped() {
        let executor = ScriptedExecutor::new().on("AS submitted", &["submitted"], vec![vec![SqlValue::Integer(4)]]);
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            metrics_agg: Some(vec!["submitted".to_string(), "domains".to_string()]),
            metrics_trends: Some(Vec::new()),
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scr), ctx, settings);

        let report = assembler.aggregate(&january(), None).unwrap();
        assert_eq!(report.get("submitted"), Some(&MetricValue::Int(4)));
        assert!(!report.contains_key("domains"));
        assert!(report.contains_key("first_date"));
    }

    #[test]
    fn test_all_items_are_filled_with_na() {
        let executor = ScriptedExecutor::new().on(
            "AS submitted",
            &["name", "submitted"],
            vec![vec![SqlValue::from("repoA"), SqlValue::Integer(7)]],
        );
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            metrics_agg: Some(vec!["submitted".to_string()]),
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scr), ctx, settings);

        let catalogue = ItemCatalogue::new(Dimension::Repository, vec!["repoA".to_string(), "repoB".to_string()]);
        let filters = january().with_dimension(Some(DimensionFilter::all_items(Dimension::Repository)));
        let report = assembler.aggregate(&filters, Some(&catalogue)).unwrap();
        assert_eq!(report.to_json(), json!({"name": ["repoA", "repoB"], "submitted": [7, "NA"]}));
    }

    #[test]
    fn test_all_items_series_are_zero_filled() {
        let executor = ScriptedExecutor::new().on(
            "AS submitted",
            &["month", "name", "submitted"],
            vec![vec![SqlValue::from("2014-01"), SqlValue::from("repoB"), SqlValue::Integer(3)]],
        );
        let ctx = QueryContext::new(&executor, None);
        let settings = ReportSettings {
            metrics_ts: Some(vec!["submitted".to_string()]),
            ..ReportSettings::default()
        };
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scr), ctx, settings);

        let catalogue = ItemCatalogue::new(Dimension::Repository, vec!["repoA".to_string(), "repoB".to_string()]);
        let filters = january().with_dimension(Some(DimensionFilter::all_items(Dimension::Repository)));
        let report = assembler.evolutionary(&filters, Some(&catalogue)).unwrap();
        assert_eq!(
            report.to_json(),
            json!({"name": ["repoA", "repoB"], "month": ["2014-01"], "submitted": [[0], [3]]})
        );
    }

    #[test]
    fn test_top_report_keys() {
        let executor = ScriptedExecutor::new();
        let ids_db = crate::query::IdentitiesDb::default();
        let ctx = QueryContext::new(&executor, Some(&ids_db));
        let assembler = ReportAssembler::new(MetricRegistry::new(DataSource::Scr), ctx, ReportSettings::default());

        let top = assembler.top(&january()).unwrap();
        let keys: Vec<_> = top.sections().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            [
                "mergers.",
                "mergers.last month",
                "mergers.last year",
                "openers.",
                "openers.last month",
                "openers.last year",
                "reviewers.",
                "reviewers.last month",
                "reviewers.last year",
            ]
        );
    }
}
