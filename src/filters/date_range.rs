use crate::Result;
use chrono::{Days, NaiveDate};
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};

/// Half-open reporting window: `start` is inclusive, `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting windows that end before they start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("invalid date range: start {start} is after end {end}");
        }

        Ok(Self { start, end })
    }

    /// The `days` long window ending right before `end`.
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self> {
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .into_app_err_with(|| format!("unable to compute a {days} day window ending at {end}"))?;
        Self::new(start, end)
    }

    /// The window of the same length immediately preceding this one.
    pub fn preceding(&self) -> Result<Self> {
        let days = u64::try_from(self.num_days()).unwrap_or_default();
        let start = self
            .start
            .checked_sub_days(Days::new(days))
            .into_app_err_with(|| format!("unable to compute the window preceding {self}"))?;
        Self::new(start, self.start)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
