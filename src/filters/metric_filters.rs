use super::{DateRange, DimensionFilter, Period};
use std::sync::Arc;

/// Number of people listed in rankings unless configured otherwise
pub const DEFAULT_NPEOPLE: u32 = 10;

/// Immutable snapshot of everything scoping a metric evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFilters {
    period: Period,
    range: DateRange,
    dimension: Option<DimensionFilter>,
    npeople: u32,
    bots: Arc<[String]>,
}

impl MetricFilters {
    #[must_use]
    pub fn new(period: Period, range: DateRange) -> Self {
        Self {
            period,
            range,
            dimension: None,
            npeople: DEFAULT_NPEOPLE,
            bots: Arc::from(Vec::new()),
        }
    }

    /// Derive a snapshot covering a different window.
    #[must_use]
    pub fn with_range(&self, range: DateRange) -> Self {
        Self { range, ..self.clone() }
    }

    /// Derive a snapshot with a different dimensional scope.
    #[must_use]
    pub fn with_dimension(&self, dimension: Option<DimensionFilter>) -> Self {
        Self { dimension, ..self.clone() }
    }

    #[must_use]
    pub fn with_npeople(&self, npeople: u32) -> Self {
        Self { npeople, ..self.clone() }
    }

    /// Derive a snapshot excluding `bots` from every ranking.
    #[must_use]
    pub fn with_bots(&self, bots: impl IntoIterator<Item = String>) -> Self {
        Self {
            bots: bots.into_iter().collect(),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    #[must_use]
    pub const fn range(&self) -> &DateRange {
        &self.range
    }

    #[must_use]
    pub const fn dimension(&self) -> Option<&DimensionFilter> {
        self.dimension.as_ref()
    }

    #[must_use]
    pub const fn npeople(&self) -> u32 {
        self.npeople
    }

    #[must_use]
    pub fn bots(&self) -> &[String] {
        &self.bots
    }

    /// Whether results are grouped by every item of a dimension.
    #[must_use]
    pub fn is_all_items(&self) -> bool {
        self.dimension.as_ref().is_some_and(DimensionFilter::is_all_items)
    }
}
