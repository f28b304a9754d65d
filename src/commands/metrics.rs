use super::Host;
use crate::Result;
use crate::metrics::{DataSource, MetricRegistry};
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;
use strum::IntoEnumIterator;

#[derive(Parser, Debug)]
pub struct MetricsArgs {
    /// Only list the metrics of these data sources
    #[arg(long = "data-source", value_name = "DATA_SOURCE")]
    pub data_sources: Vec<DataSource>,
}

/// Print every registered metric with its data source, name and description.
pub fn list_metrics<H: Host>(host: &mut H, args: &MetricsArgs) -> Result<()> {
    let mut output = host.output();

    for data_source in DataSource::iter().filter(|ds| args.data_sources.is_empty() || args.data_sources.contains(ds)) {
        for metric in MetricRegistry::new(data_source).iter() {
            let def = metric.def();
            writeln!(output, "{:<10} {:<24} {:<24} {}", data_source.as_str(), def.id, def.name, def.description)
                .into_app_err("unable to write the metric list")?;
        }
    }

    Ok(())
}
