use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Kind of crawler-populated database metrics are computed from
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Source code management (commits)
    Scm,
    /// Source code review (review requests and their changes)
    Scr,
    Releases,
    Downloads,
}

impl DataSource {
    /// Name of the data source, used as the prefix of report files and config keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_round_trip() {
        for ds in DataSource::iter() {
            assert_eq!(ds.as_str().parse::<DataSource>().unwrap(), ds);
        }
        assert_eq!(DataSource::Scr.to_string(), "scr");
        let _ = "its".parse::<DataSource>().unwrap_err();
    }

    #[test]
    fn test_command_line_values() {
        let names: Vec<_> = DataSource::value_variants()
            .iter()
            .filter_map(ValueEnum::to_possible_value)
            .map(|value| value.get_name().to_string())
            .collect();
        assert_eq!(names, ["scm", "scr", "releases", "downloads"]);
        assert_eq!(<DataSource as ValueEnum>::from_str("SCR", true).unwrap(), DataSource::Scr);
    }
}
