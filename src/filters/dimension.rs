use clap::ValueEnum;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// Axis along which metric computation can be scoped or grouped
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    StrumDisplay,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Repository,
    Company,
    Country,
    Project,
    Domain,
    People,
}

impl Dimension {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Tag used in the names of per-item report files.
    #[must_use]
    pub const fn file_tag(self) -> &'static str {
        match self {
            Self::Repository => "rep",
            Self::Company => "com",
            Self::Country => "cou",
            Self::Project => "prj",
            Self::Domain => "dom",
            Self::People => "people",
        }
    }

    /// Plural used in the names of item summary files.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Repository => "repos",
            Self::Company => "companies",
            Self::Country => "countries",
            Self::Project => "projects",
            Self::Domain => "domains",
            Self::People => "people",
        }
    }

    /// Whether scoping by this dimension joins against the identities database.
    #[must_use]
    pub const fn needs_identities(self) -> bool {
        matches!(self, Self::Company | Self::Country | Self::Project | Self::Domain)
    }
}

/// Scopes a computation to one value of a dimension, or groups it by every value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DimensionFilter {
    dimension: Dimension,
    value: Option<String>,
}

impl DimensionFilter {
    /// Scope to a single item, e.g. `("repository", "libfoo")`.
    #[must_use]
    pub fn scoped(dimension: Dimension, value: impl Into<String>) -> Self {
        Self {
            dimension,
            value: Some(value.into()),
        }
    }

    /// Group by every item of the dimension.
    #[must_use]
    pub const fn all_items(dimension: Dimension) -> Self {
        Self { dimension, value: None }
    }

    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub const fn is_all_items(&self) -> bool {
        self.value.is_none()
    }
}

impl Display for DimensionFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.dimension),
            None => write!(f, "{}=*", self.dimension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_scoped_filter() {
        let filter = DimensionFilter::scoped(Dimension::Repository, "libfoo");
        assert_eq!(filter.dimension(), Dimension::Repository);
        assert_eq!(filter.value(), Some("libfoo"));
        assert!(!filter.is_all_items());
        assert_eq!(filter.to_string(), "repository=libfoo");
    }

    #[test]
    fn test_all_items_filter() {
        let filter = DimensionFilter::all_items(Dimension::Company);
        assert!(filter.is_all_items());
        assert_eq!(filter.value(), None);
        assert_eq!(filter.to_string(), "company=*");
    }

    #[test]
    fn test_identity_backed_dimensions() {
        let needing: Vec<_> = Dimension::iter().filter(|d| d.needs_identities()).collect();
        assert_eq!(
            needing,
            vec![Dimension::Company, Dimension::Country, Dimension::Project, Dimension::Domain]
        );
    }

    #[test]
    fn test_file_tags_are_unique() {
        let mut tags: Vec<_> = Dimension::iter().map(Dimension::file_tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), Dimension::iter().count());
    }
}
