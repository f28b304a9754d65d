use super::completion::round2;
use super::{MetricDef, MetricError, MetricResult, MetricValue};
use crate::filters::{DateRange, MetricFilters};
use crate::query::QueryContext;
use chrono::NaiveDate;
use core::fmt::Debug;

/// A unit of measurement bound to a data source.
///
/// Metrics are stateless: the filters scoping an evaluation and the context used to
/// reach the data are passed to every call, so one registered instance can serve any
/// number of reports.
pub trait Metric: Sync + Debug {
    fn def(&self) -> &MetricDef;

    fn id(&self) -> &'static str {
        self.def().id
    }

    /// Aggregate value(s) over the filter window.
    ///
    /// In all-items mode the result is grouped: a `name` list and one value per item.
    fn agg(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError>;

    /// Series with one value per period bucket of the filter window.
    ///
    /// In all-items mode the result holds the item names and one series per item.
    fn ts(&self, ctx: &QueryContext<'_>, filters: &MetricFilters) -> Result<MetricResult, MetricError>;

    /// Ranked identities, restricted to the last `days` before the newest activity
    /// when `days` is not zero.
    fn list(&self, _ctx: &QueryContext<'_>, _filters: &MetricFilters, _days: u32) -> Result<MetricResult, MetricError> {
        Err(MetricError::unsupported(self.id(), "no ranked list is defined"))
    }

    /// Value over the `days` ending at `end` compared with the window before it.
    fn trends(
        &self,
        ctx: &QueryContext<'_>,
        filters: &MetricFilters,
        end: NaiveDate,
        days: u32,
    ) -> Result<MetricResult, MetricError> {
        windowed_trends(self, ctx, filters, end, days)
    }
}

/// Compare the aggregate of the window `[end - days, end)` with the preceding window.
///
/// Emits `<id>_<days>`, the net difference `diff_net<id>_<days>` and the size of the
/// change relative to the previous window as `percentage_<id>_<days>`, which is `null`
/// when the previous window had no activity.
pub fn windowed_trends<M: Metric + ?Sized>(
    metric: &M,
    ctx: &QueryContext<'_>,
    filters: &MetricFilters,
    end: NaiveDate,
    days: u32,
) -> Result<MetricResult, MetricError> {
    let id = metric.id();
    if filters.is_all_items() {
        return Err(MetricError::unsupported(id, "trends are not computed per item"));
    }

    let current_range = DateRange::trailing(end, days)?;
    let previous_range = current_range.preceding()?;

    let current = trend_value(&metric.agg(ctx, &filters.with_range(current_range))?, id);
    let previous = trend_value(&metric.agg(ctx, &filters.with_range(previous_range))?, id);
    let diff = current.minus(&previous);

    let percentage = match (diff.as_f64(), previous.as_f64()) {
        (Some(diff), Some(previous)) if previous != 0.0 => MetricValue::Float(round2(diff.abs() / previous * 100.0)),
        _ => MetricValue::Null,
    };

    Ok(MetricResult::new()
        .with(format!("{id}_{days}"), current)
        .with(format!("diff_net{id}_{days}"), diff)
        .with(format!("percentage_{id}_{days}"), percentage))
}

fn trend_value(result: &MetricResult, id: &str) -> MetricValue {
    match result.get(id) {
        Some(value @ (MetricValue::Int(_) | MetricValue::Float(_))) => value.clone(),
        _ => MetricValue::Int(0),
    }
}
