use super::DataSource;
use crate::filters::Dimension;

/// Failure of a single metric evaluation.
///
/// Only [`MetricError::Configuration`] is fatal to a report. Every other variant
/// degrades the contribution of the metric that raised it.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{data_source} does not support the {dimension} dimension")]
    UnsupportedDimension { data_source: DataSource, dimension: Dimension },

    #[error("metric '{metric}' is not supported here: {reason}")]
    Unsupported { metric: &'static str, reason: String },

    #[error("metric '{metric}' combines series of different lengths (expected {expected}, found {actual})")]
    AlignmentMismatch {
        metric: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("conflicting values merged under key '{key}'")]
    KeyCollision { key: String },

    #[error("query failed: {0}")]
    Query(ohno::AppError),
}

impl MetricError {
    /// Whether the error must abort the report being assembled.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub(crate) fn unsupported(metric: &'static str, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            metric,
            reason: reason.into(),
        }
    }
}

impl From<ohno::AppError> for MetricError {
    fn from(err: ohno::AppError) -> Self {
        Self::Query(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(MetricError::Configuration("missing identities".into()).is_fatal());
        assert!(!MetricError::unsupported("domains", "no count").is_fatal());
        assert!(
            !MetricError::UnsupportedDimension {
                data_source: DataSource::Scr,
                dimension: Dimension::Domain
            }
            .is_fatal()
        );
        assert!(!MetricError::from(ohno::app_err!("connection lost")).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = MetricError::UnsupportedDimension {
            data_source: DataSource::Scr,
            dimension: Dimension::Domain,
        };
        assert_eq!(err.to_string(), "scr does not support the domain dimension");

        let err = MetricError::AlignmentMismatch {
            metric: "pending",
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("expected 3, found 2"));
    }
}
