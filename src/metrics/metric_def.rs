use super::DataSource;

/// Static description of a metric.
#[derive(Debug)]
pub struct MetricDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub data_source: DataSource,
}

macro_rules! metric_def {
    ($data_source:ident, $id:expr, $name:expr, $description:expr) => {
        $crate::metrics::MetricDef {
            id: $id,
            name: $name,
            description: $description,
            data_source: $crate::metrics::DataSource::$data_source,
        }
    };
}

pub(crate) use metric_def;
