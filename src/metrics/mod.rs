//! Metric definitions and the per data source registries
//!
//! A metric measures one aspect of project activity (commits, review requests,
//! releases, downloads...) and knows how to compute it from the database of its
//! [`DataSource`], over any window and for any dimension scope that data source
//! supports.
//!
//! # Implementation Model
//!
//! Every metric implements the [`Metric`] trait, with four views:
//! - **Aggregate** (`agg`): a single value over the filter window, or one value per
//!   item when the dimension filter selects all items.
//! - **Series** (`ts`): one value per period bucket, completed so that buckets without
//!   activity read as zero.
//! - **Ranking** (`list`): the most active identities, optionally restricted to the
//!   last days before the newest activity.
//! - **Trend** (`trends`): the aggregate over a trailing window compared with the
//!   window before it.
//!
//! Most metrics are a [`CountMetric`]: a static [`MetricDef`] plus a function building
//! the SQL of the count. The fragment of the active dimension filter is added by
//! [`CountMetric`] itself, so query functions only describe what is counted. Derived
//! metrics such as `pending` compose the results of other metrics instead.
//!
//! Metrics are registered per data source in a [`DataSourceProfile`], which also
//! names the default metric sets used by reports. [`MetricRegistry`] is the typed
//! lookup over a profile.
//!
//! Results are [`MetricResult`] maps of column name to [`MetricValue`]. Failures are
//! [`MetricError`] values; only configuration errors are fatal to a report.

mod completion;
mod count_metric;
mod data_source;
mod downloads;
mod metric;
mod metric_def;
mod metric_error;
mod metric_result;
mod metric_value;
mod registry;
mod releases;
mod scm;
mod scr;

pub use completion::round2;
pub use count_metric::{CountMetric, ListFn, QueryFn, ranked_list};
pub use data_source::DataSource;
pub use metric::{Metric, windowed_trends};
pub use metric_def::MetricDef;
pub(crate) use metric_def::metric_def;
pub use metric_error::MetricError;
pub use metric_result::{ItemCatalogue, MetricResult, NAME_KEY};
pub use metric_value::{MetricValue, NA, metric_value_to_json};
pub use registry::{ALL_TIME_WINDOW, DataSourceProfile, MetricRegistry, STANDARD_WINDOWS, TopRole, TopWindow};
