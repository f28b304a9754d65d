//! Reporting windows, granularity and dimensional scoping
//!
//! Every metric evaluation receives a [`MetricFilters`] snapshot describing what
//! to compute: the [`Period`] used to bucket time series, the [`DateRange`] being
//! reported on, an optional [`DimensionFilter`] scoping the computation to one
//! repository/company/country/project (or grouping by all of them), the top-N limit
//! and the identities excluded from rankings.
//!
//! # Implementation Model
//!
//! Filters are immutable values. Anything that needs a different window or scope
//! derives a new snapshot through the `with_*` methods instead of mutating a shared
//! instance, so successive metric evaluations can never observe each other's scope.
//!
//! Date ranges are half-open: the start is inclusive and the end is exclusive in
//! every comparison made against a date column.

mod date_range;
mod dimension;
mod metric_filters;
mod period;

pub use date_range::DateRange;
pub use dimension::{Dimension, DimensionFilter};
pub use metric_filters::{DEFAULT_NPEOPLE, MetricFilters};
pub use period::Period;
