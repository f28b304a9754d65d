use super::{Fragment, sql_literal};
use crate::filters::{DateRange, Period};

/// Typed description of a counting query, rendered against a date window.
///
/// Tables and conditions are kept in insertion order and deduplicated, so a metric
/// and the fragment scoping it can both name the same join without producing
/// duplicate aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlQuery {
    fields: Vec<String>,
    tables: Vec<String>,
    conditions: Vec<String>,
    date_field: String,
    item_field: Option<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    limit: Option<u32>,
}

impl SqlQuery {
    /// Start a query whose rows are windowed on `date_field`.
    #[must_use]
    pub fn new(date_field: impl Into<String>) -> Self {
        Self {
            date_field: date_field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        push_unique(&mut self.tables, table.into());
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        push_unique(&mut self.conditions, condition.into());
        self
    }

    /// Add the tables and conditions of `fragment`, grouping by its item when it has one.
    #[must_use]
    pub fn with_fragment(mut self, fragment: &Fragment) -> Self {
        for table in fragment.tables() {
            push_unique(&mut self.tables, table.clone());
        }
        for condition in fragment.conditions() {
            push_unique(&mut self.conditions, condition.clone());
        }
        if let Some(item) = fragment.item_field() {
            self.item_field = Some(item.to_string());
        }
        self
    }

    /// Exclude rows whose `column` holds any of `values`.
    #[must_use]
    pub fn exclude(self, column: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }

        let list = values.iter().map(|value| sql_literal(value)).collect::<Vec<_>>().join(", ");
        self.condition(format!("{column} NOT IN ({list})"))
    }

    /// Keep only rows dated less than `days` before the newest `column` of `table`.
    ///
    /// A `days` of zero keeps every row.
    #[must_use]
    pub fn within_days_of_latest(self, days: u32, table: &str, column: &str) -> Self {
        if days == 0 {
            return self;
        }

        let condition = format!(
            "julianday((SELECT MAX({column}) FROM {table})) - julianday({}) < {days}",
            self.date_field
        );
        self.condition(condition)
    }

    #[must_use]
    pub fn group_by(mut self, expression: impl Into<String>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, expression: impl Into<String>) -> Self {
        self.order_by.push(expression.into());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn date_field(&self) -> &str {
        &self.date_field
    }

    #[must_use]
    pub fn item_field(&self) -> Option<&str> {
        self.item_field.as_deref()
    }

    /// One row for the whole window, or one row per item when grouping by item.
    #[must_use]
    pub fn global(&self, range: &DateRange) -> String {
        let mut select = Vec::new();
        let mut group_by = self.group_by.clone();
        let mut order_by = self.order_by.clone();

        if let Some(item) = &self.item_field {
            select.push(format!("{item} AS name"));
            group_by.push(item.clone());
            if order_by.is_empty() {
                order_by.push("name".to_string());
            }
        }
        select.extend(self.fields.iter().cloned());

        self.render(&select, range, &group_by, &order_by)
    }

    /// One row per period bucket (and per item when grouping by item).
    #[must_use]
    pub fn periodic(&self, period: Period, range: &DateRange) -> String {
        let bucket = period.bucket_sql(&self.date_field);
        let mut select = vec![format!("{bucket} AS {period}")];
        let mut group_by = vec![bucket];
        let mut order_by = vec![period.to_string()];

        if let Some(item) = &self.item_field {
            select.push(format!("{item} AS name"));
            group_by.push(item.clone());
            order_by.push("name".to_string());
        }
        select.extend(self.fields.iter().cloned());

        self.render(&select, range, &group_by, &order_by)
    }

    /// Ungrouped rows, with the item name as a column when grouping by item.
    #[must_use]
    pub fn raw(&self, range: &DateRange) -> String {
        let mut select = Vec::new();
        if let Some(item) = &self.item_field {
            select.push(format!("{item} AS name"));
        }
        select.extend(self.fields.iter().cloned());

        self.render(&select, range, &[], &self.order_by)
    }

    fn render(&self, select: &[String], range: &DateRange, group_by: &[String], order_by: &[String]) -> String {
        let mut conditions = self.conditions.clone();
        conditions.push(format!("{} >= {}", self.date_field, sql_literal(&range.start().to_string())));
        conditions.push(format!("{} < {}", self.date_field, sql_literal(&range.end().to_string())));

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {}",
            select.join(", "),
            self.tables.join(", "),
            conditions.join(" AND ")
        );

        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        sql
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn january() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 2, 1).unwrap(),
        )
        .unwrap()
    }

    fn commits() -> SqlQuery {
        SqlQuery::new("s.date").field("COUNT(DISTINCT(s.id)) AS ncommits").table("scmlog s")
    }

    #[test]
    fn test_global_query() {
        insta::assert_snapshot!(
            commits().global(&january()),
            @"SELECT COUNT(DISTINCT(s.id)) AS ncommits FROM scmlog s WHERE s.date >= '2014-01-01' AND s.date < '2014-02-01'"
        );
    }

    #[test]
    fn test_periodic_query() {
        insta::assert_snapshot!(
            commits().periodic(Period::Month, &january()),
            @"SELECT strftime('%Y-%m', s.date) AS month, COUNT(DISTINCT(s.id)) AS ncommits FROM scmlog s WHERE s.date >= '2014-01-01' AND s.date < '2014-02-01' GROUP BY strftime('%Y-%m', s.date) ORDER BY month"
        );
    }

    #[test]
    fn test_tables_and_conditions_are_deduplicated() {
        let sql = commits()
            .table("scmlog s")
            .table("people_upeople pup")
            .condition("s.author_id = pup.people_id")
            .condition("s.author_id = pup.people_id")
            .global(&january());
        assert_eq!(sql.matches("scmlog s").count(), 1);
        assert_eq!(sql.matches("s.author_id = pup.people_id").count(), 1);
    }

    #[test]
    fn test_exclusions_are_quoted() {
        let sql = commits().exclude("u.identifier", &["bot".to_string(), "o'brien".to_string()]).global(&january());
        assert!(sql.contains("u.identifier NOT IN ('bot', 'o''brien')"));

        let unchanged = commits().exclude("u.identifier", &[]);
        assert_eq!(unchanged, commits());
    }

    #[test]
    fn test_recent_window() {
        let sql = commits().within_days_of_latest(31, "scmlog", "date").global(&january());
        assert!(sql.contains("julianday((SELECT MAX(date) FROM scmlog)) - julianday(s.date) < 31"));
        assert_eq!(commits().within_days_of_latest(0, "scmlog", "date"), commits());
    }

    #[test]
    fn test_ranking_clauses() {
        let sql = commits().group_by("s.author_id").order_by("ncommits DESC").limit(5).global(&january());
        assert!(sql.ends_with("GROUP BY s.author_id ORDER BY ncommits DESC LIMIT 5"));
    }
}
