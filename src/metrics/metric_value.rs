use crate::query::SqlValue;
use serde_json::json;

/// Marker stored for items that have no value in an aggregate report.
pub const NA: &str = "NA";

/// A single entry of a metric result.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
}

impl MetricValue {
    #[must_use]
    pub fn na() -> Self {
        Self::Text(NA.to_string())
    }

    /// A counted value: missing or `NULL` cells count as zero.
    #[must_use]
    pub fn count(value: Option<&SqlValue>) -> Self {
        match value {
            None | Some(SqlValue::Null) => Self::Int(0),
            Some(value) => Self::from(value),
        }
    }

    /// A series of `len` zeros.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::List(vec![Self::Int(0); len])
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "activity counts are far below 2^52")]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Difference of two numeric values, staying integral when both operands are.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a - b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => Self::Float(a - b),
                _ => Self::Null,
            },
        }
    }
}

impl From<&SqlValue> for MetricValue {
    fn from(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Integer(value) => Self::Int(*value),
            SqlValue::Real(value) => Self::Float(*value),
            SqlValue::Text(value) => Self::Text(value.clone()),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Self>> for MetricValue {
    fn from(values: Vec<Self>) -> Self {
        Self::List(values)
    }
}

pub fn metric_value_to_json(value: &MetricValue) -> serde_json::Value {
    match value {
        MetricValue::Null => serde_json::Value::Null,
        MetricValue::Int(i) => json!(i),
        // non-finite floats have no JSON form and serialize as null
        MetricValue::Float(f) => json!(f),
        MetricValue::Text(s) => json!(s),
        MetricValue::List(values) => json!(values.iter().map(metric_value_to_json).collect::<Vec<_>>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_treats_null_as_zero() {
        assert_eq!(MetricValue::count(None), MetricValue::Int(0));
        assert_eq!(MetricValue::count(Some(&SqlValue::Null)), MetricValue::Int(0));
        assert_eq!(MetricValue::count(Some(&SqlValue::Integer(4))), MetricValue::Int(4));
        assert_eq!(MetricValue::count(Some(&SqlValue::Real(1.5))), MetricValue::Float(1.5));
    }

    #[test]
    fn test_minus() {
        assert_eq!(MetricValue::Int(5).minus(&MetricValue::Int(7)), MetricValue::Int(-2));
        assert_eq!(MetricValue::Float(2.5).minus(&MetricValue::Int(1)), MetricValue::Float(1.5));
        assert_eq!(MetricValue::na().minus(&MetricValue::Int(1)), MetricValue::Null);
    }

    #[test]
    fn test_json_conversion() {
        let value = MetricValue::List(vec![MetricValue::Int(1), MetricValue::na(), MetricValue::Null]);
        assert_eq!(metric_value_to_json(&value), json!([1, "NA", null]));
        assert_eq!(metric_value_to_json(&MetricValue::Float(f64::NAN)), serde_json::Value::Null);
    }
}
