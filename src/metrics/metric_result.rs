use super::{MetricError, MetricValue, metric_value_to_json};
use crate::filters::Dimension;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

const LOG_TARGET: &str = "    result";

/// Key holding the item names of a result grouped by dimension item.
pub const NAME_KEY: &str = "name";

/// Named values produced by one or more metric evaluations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricResult {
    values: BTreeMap<String, MetricValue>,
}

impl MetricResult {
    #[must_use]
    pub const fn new() -> Self {
        Self { values: BTreeMap::new() }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        let _ = self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetricValue> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Item names of a grouped result.
    #[must_use]
    pub fn names(&self) -> Option<Vec<&str>> {
        self.get(NAME_KEY)?
            .as_list()
            .map(|names| names.iter().filter_map(MetricValue::as_text).collect())
    }

    /// Union `other` into this result.
    ///
    /// Keys present on both sides must hold the same value, as happens with the
    /// period labels every series carries. A differing value is an error in debug
    /// builds and overwrites the existing one otherwise.
    pub fn merge(&mut self, other: Self) -> Result<(), MetricError> {
        for (key, value) in other.values {
            match self.values.entry(key) {
                Entry::Vacant(entry) => {
                    let _ = entry.insert(value);
                }
                Entry::Occupied(mut entry) => {
                    if *entry.get() == value {
                        continue;
                    }
                    if cfg!(debug_assertions) {
                        return Err(MetricError::KeyCollision { key: entry.key().clone() });
                    }
                    log::warn!(target: LOG_TARGET, "Overwriting conflicting values for key '{}'", entry.key());
                    let _ = entry.insert(value);
                }
            }
        }

        Ok(())
    }

    /// Align a grouped result against `catalogue`.
    ///
    /// Every per-item column is rewritten to hold exactly one entry per catalogue item,
    /// in catalogue order, using `fill` for items the result has no row for. Keys listed
    /// in `shared` (such as the period labels of a series) are not per item and are
    /// kept as they are. Results that are not grouped are returned unchanged.
    pub fn reconcile(self, catalogue: &ItemCatalogue, fill: &MetricValue, shared: &[&str]) -> Result<Self, MetricError> {
        let Some(names) = self.names().map(|names| names.into_iter().map(str::to_string).collect::<Vec<_>>()) else {
            return Ok(self);
        };

        let mut reconciled = Self::new().with(
            NAME_KEY,
            catalogue.items().iter().map(|item| MetricValue::from(item.as_str())).collect::<Vec<_>>(),
        );

        for (key, value) in self.values {
            if key == NAME_KEY {
                continue;
            }
            if shared.contains(&key.as_str()) {
                reconciled.set(key, value);
                continue;
            }

            let MetricValue::List(values) = value else {
                reconciled.set(key, value);
                continue;
            };
            if values.len() != names.len() {
                return Err(MetricError::AlignmentMismatch {
                    metric: "reconcile",
                    expected: names.len(),
                    actual: values.len(),
                });
            }

            let by_name: BTreeMap<&str, MetricValue> = names.iter().map(String::as_str).zip(values).collect();
            let aligned = catalogue
                .items()
                .iter()
                .map(|item| by_name.get(item.as_str()).cloned().unwrap_or_else(|| fill.clone()))
                .collect::<Vec<_>>();
            reconciled.set(key, aligned);
        }

        Ok(reconciled)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(key, value)| (key.clone(), metric_value_to_json(value)))
                .collect(),
        )
    }
}

impl IntoIterator for MetricResult {
    type Item = (String, MetricValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, MetricValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Canonical ordered list of the values of a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCatalogue {
    dimension: Dimension,
    items: Vec<String>,
}

impl ItemCatalogue {
    #[must_use]
    pub const fn new(dimension: Dimension, items: Vec<String>) -> Self {
        Self { dimension, items }
    }

    /// Build a catalogue from a grouped count, most active items first and ties by name.
    #[must_use]
    pub fn ranked(dimension: Dimension, result: &MetricResult, count_key: &str) -> Self {
        let names = result.names().unwrap_or_default();
        let counts = result.get(count_key).and_then(MetricValue::as_list).unwrap_or_default();

        let mut ranked: Vec<(&str, f64)> = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name, counts.get(index).and_then(MetricValue::as_f64).unwrap_or_default()))
            .collect();
        ranked.sort_by(|(a_name, a_count), (b_name, b_count)| b_count.total_cmp(a_count).then_with(|| a_name.cmp(b_name)));

        Self::new(dimension, ranked.into_iter().map(|(name, _)| name.to_string()).collect())
    }

    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
