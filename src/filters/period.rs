use super::DateRange;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Granularity used to bucket evolutionary series
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Name of the period, also used as the key of the bucket labels in series results.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// SQL expression producing the bucket label of `column`.
    ///
    /// The labels match the ones produced by [`Period::label`], which lets query rows be
    /// matched against the full bucket list when completing series.
    #[must_use]
    pub fn bucket_sql(self, column: &str) -> String {
        match self {
            Self::Day => format!("strftime('%Y-%m-%d', {column})"),
            Self::Week => format!("date({column}, 'weekday 0', '-6 days')"),
            Self::Month => format!("strftime('%Y-%m', {column})"),
            Self::Quarter => {
                format!("strftime('%Y', {column}) || '-Q' || ((CAST(strftime('%m', {column}) AS INTEGER) + 2) / 3)")
            }
            Self::Year => format!("strftime('%Y', {column})"),
        }
    }

    /// First day of the bucket containing `date`.
    #[must_use]
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        let first_of = |month: u32| NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);

        match self {
            Self::Day => date,
            Self::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            Self::Month => first_of(date.month()),
            Self::Quarter => first_of((date.month0() / 3) * 3 + 1),
            Self::Year => first_of(1),
        }
    }

    fn next_bucket(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => start.checked_add_days(Days::new(1)),
            Self::Week => start.checked_add_days(Days::new(7)),
            Self::Month => start.checked_add_months(Months::new(1)),
            Self::Quarter => start.checked_add_months(Months::new(3)),
            Self::Year => start.checked_add_months(Months::new(12)),
        }
    }

    /// Label of the bucket containing `date`.
    #[must_use]
    pub fn label(self, date: NaiveDate) -> String {
        let start = self.bucket_start(date);
        match self {
            Self::Day | Self::Week => start.format("%Y-%m-%d").to_string(),
            Self::Month => start.format("%Y-%m").to_string(),
            Self::Quarter => format!("{}-Q{}", start.year(), start.month0() / 3 + 1),
            Self::Year => start.format("%Y").to_string(),
        }
    }

    /// Labels of every bucket overlapping `range`, oldest first.
    #[must_use]
    pub fn buckets(self, range: &DateRange) -> Vec<String> {
        let mut labels = Vec::new();
        let mut current = self.bucket_start(range.start());

        while current < range.end() {
            labels.push(self.label(current));
            match self.next_bucket(current) {
                Some(next) => current = next,
                None => break,
            }
        }

        labels
    }

    /// Label and window of every bucket overlapping `range`, each clipped to `range`.
    #[must_use]
    pub fn bucket_ranges(self, range: &DateRange) -> Vec<(String, DateRange)> {
        let mut windows = Vec::new();
        let mut current = self.bucket_start(range.start());

        while current < range.end() {
            let next = self.next_bucket(current).unwrap_or(range.end());
            if let Ok(window) = DateRange::new(current.max(range.start()), next.min(range.end())) {
                windows.push((self.label(current), window));
            }
            if next <= current {
                break;
            }
            current = next;
        }

        windows
    }

    /// Number of buckets a complete series over `range` holds.
    #[must_use]
    pub fn bucket_count(self, range: &DateRange) -> usize {
        self.buckets(range).len()
    }
}
