use crate::metrics::{MetricResult, MetricValue};
use std::collections::{BTreeMap, HashSet};

/// Key holding the identity of each ranked person.
const ID_KEY: &str = "id";

/// Key of the deduplicated list of everyone ranked in the report.
const PEOPLE_KEY: &str = "people";

/// Rankings of a data source, keyed `<role>.<window>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopReport {
    sections: BTreeMap<String, MetricResult>,
}

impl TopReport {
    #[must_use]
    pub const fn new() -> Self {
        Self { sections: BTreeMap::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, ranking: MetricResult) {
        let _ = self.sections.insert(key.into(), ranking);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetricResult> {
        self.sections.get(key)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &MetricResult)> {
        self.sections.iter().map(|(key, ranking)| (key.as_str(), ranking))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Identities ranked in any section, each listed once in first-seen order.
    ///
    /// Sections are visited in key order, so the all-time ranking of a role comes
    /// before its windowed ones.
    #[must_use]
    pub fn people(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.sections
            .values()
            .filter_map(|ranking| ranking.get(ID_KEY).and_then(MetricValue::as_list))
            .flatten()
            .filter_map(identity)
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Every section under its key, plus the [`Self::people`] list.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut json: serde_json::Map<String, serde_json::Value> = self
            .sections
            .iter()
            .map(|(key, ranking)| (key.clone(), ranking.to_json()))
            .collect();
        let _ = json.insert(PEOPLE_KEY.to_string(), self.people().into());
        serde_json::Value::Object(json)
    }
}

fn identity(value: &MetricValue) -> Option<String> {
    match value {
        MetricValue::Int(id) => Some(id.to_string()),
        MetricValue::Text(id) => Some(id.clone()),
        _ => None,
    }
}
