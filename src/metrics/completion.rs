//! Conversion of query rows into complete metric results.
//!
//! Queries only return rows for buckets and items that had activity. These helpers
//! turn them into results where every period bucket of the window is present and
//! counts that were never observed read as zero.

use super::metric_result::NAME_KEY;
use super::{MetricResult, MetricValue};
use crate::filters::{DateRange, Period};
use crate::query::{QueryResult, SqlValue};
use std::collections::{BTreeMap, BTreeSet};

/// Single-row aggregate: one value per column.
#[must_use]
pub fn scalar_aggregate(rows: &QueryResult, columns: &[&str]) -> MetricResult {
    let mut result = MetricResult::new();
    for column in columns {
        result.set(*column, MetricValue::count(rows.scalar(column)));
    }
    result
}

/// Aggregate grouped by item: the item names plus one list per column.
#[must_use]
pub fn grouped_aggregate(rows: &QueryResult, columns: &[&str]) -> MetricResult {
    let names = column_values(rows, NAME_KEY, |value| MetricValue::from(value.as_text().unwrap_or_default()));
    let mut result = MetricResult::new().with(NAME_KEY, names);
    for column in columns {
        result.set(*column, column_values(rows, column, |value| MetricValue::count(Some(value))));
    }
    result
}

/// Per-period series, with a zero for every bucket of `range` that has no row.
#[must_use]
pub fn complete_periods(rows: &QueryResult, period: Period, range: &DateRange, columns: &[&str]) -> MetricResult {
    let labels = period.buckets(range);
    let label_index = rows.column_index(period.as_str());

    let mut by_label: BTreeMap<String, &[SqlValue]> = BTreeMap::new();
    if let Some(index) = label_index {
        for row in rows.rows() {
            if let Some(label) = row.get(index).and_then(SqlValue::as_text) {
                let _ = by_label.insert(label, row.as_slice());
            }
        }
    }

    let mut result = MetricResult::new().with(period.as_str(), labels_value(&labels));
    for column in columns {
        let index = rows.column_index(column);
        let series = labels
            .iter()
            .map(|label| MetricValue::count(by_label.get(label).zip(index).and_then(|(row, index)| row.get(index))))
            .collect::<Vec<_>>();
        result.set(*column, series);
    }
    result
}

/// Per-period series for every item, each completed to the full bucket list.
///
/// Items are listed by name; each column holds one series per item.
#[must_use]
pub fn complete_grouped_periods(rows: &QueryResult, period: Period, range: &DateRange, columns: &[&str]) -> MetricResult {
    let labels = period.buckets(range);
    let label_index = rows.column_index(period.as_str());
    let name_index = rows.column_index(NAME_KEY);

    let mut names = BTreeSet::new();
    let mut by_key: BTreeMap<(String, String), &[SqlValue]> = BTreeMap::new();
    if let (Some(label_index), Some(name_index)) = (label_index, name_index) {
        for row in rows.rows() {
            let label = row.get(label_index).and_then(SqlValue::as_text);
            let name = row.get(name_index).and_then(SqlValue::as_text);
            if let (Some(label), Some(name)) = (label, name) {
                let _ = names.insert(name.clone());
                let _ = by_key.insert((name, label), row.as_slice());
            }
        }
    }

    let mut result = MetricResult::new()
        .with(NAME_KEY, names.iter().map(|name| MetricValue::from(name.as_str())).collect::<Vec<_>>())
        .with(period.as_str(), labels_value(&labels));

    for column in columns {
        let index = rows.column_index(column);
        let per_item = names
            .iter()
            .map(|name| {
                MetricValue::List(
                    labels
                        .iter()
                        .map(|label| {
                            let row = by_key.get(&(name.clone(), label.clone()));
                            MetricValue::count(row.zip(index).and_then(|(row, index)| row.get(index)))
                        })
                        .collect(),
                )
            })
            .collect::<Vec<_>>();
        result.set(*column, per_item);
    }
    result
}

/// Round to two decimals, the precision reports carry for derived values.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn labels_value(labels: &[String]) -> MetricValue {
    MetricValue::List(labels.iter().map(|label| MetricValue::from(label.as_str())).collect())
}

fn column_values(rows: &QueryResult, column: &str, convert: impl Fn(&SqlValue) -> MetricValue) -> Vec<MetricValue> {
    rows.column(column).map(|values| values.map(convert).collect()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn first_quarter() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 4, 1).unwrap(),
        )
        .unwrap()
    }

    fn rows(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> QueryResult {
        QueryResult::new(columns.iter().map(ToString::to_string).collect(), rows)
    }

    #[test]
    fn test_scalar_aggregate_zero_fills() {
        let result = scalar_aggregate(&rows(&["ncommits"], vec![vec![SqlValue::Null]]), &["ncommits"]);
        assert_eq!(result.get("ncommits"), Some(&MetricValue::Int(0)));

        let result = scalar_aggregate(&QueryResult::default(), &["ncommits"]);
        assert_eq!(result.get("ncommits"), Some(&MetricValue::Int(0)));
    }

    #[test]
    fn test_grouped_aggregate() {
        let result = grouped_aggregate(
            &rows(
                &["name", "submitted"],
                vec![vec!["repoA".into(), SqlValue::Integer(4)], vec!["repoB".into(), SqlValue::Integer(1)]],
            ),
            &["submitted"],
        );
        assert_eq!(result.to_json(), json!({"name": ["repoA", "repoB"], "submitted": [4, 1]}));
    }

    #[test]
    fn test_complete_periods_fills_gaps() {
        let result = complete_periods(
            &rows(&["month", "ncommits"], vec![vec!["2014-02".into(), SqlValue::Integer(5)]]),
            Period::Month,
            &first_quarter(),
            &["ncommits"],
        );
        assert_eq!(
            result.to_json(),
            json!({"month": ["2014-01", "2014-02", "2014-03"], "ncommits": [0, 5, 0]})
        );
    }

    #[test]
    fn test_series_length_matches_bucket_count() {
        for period in [Period::Day, Period::Week, Period::Month, Period::Quarter, Period::Year] {
            let result = complete_periods(&QueryResult::default(), period, &first_quarter(), &["ncommits"]);
            let series = result.get("ncommits").and_then(MetricValue::as_list).unwrap();
            assert_eq!(series.len(), period.bucket_count(&first_quarter()), "{period}");
        }
    }

    #[test]
    fn test_complete_grouped_periods() {
        let result = complete_grouped_periods(
            &rows(
                &["month", "name", "submitted"],
                vec![
                    vec!["2014-01".into(), "repoB".into(), SqlValue::Integer(2)],
                    vec!["2014-03".into(), "repoA".into(), SqlValue::Integer(1)],
                ],
            ),
            Period::Month,
            &first_quarter(),
            &["submitted"],
        );
        assert_eq!(
            result.to_json(),
            json!({
                "name": ["repoA", "repoB"],
                "month": ["2014-01", "2014-02", "2014-03"],
                "submitted": [[0, 0, 1], [2, 0, 0]],
            })
        );
    }

    #[test]
    fn test_round2() {
        assert!((round2(1.23456) - 1.23).abs() < f64::EPSILON);
        assert!((round2(2.0 / 3.0) - 0.67).abs() < f64::EPSILON);
    }
}
