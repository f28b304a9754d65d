use super::Host;
use super::common::{LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::filters::Dimension;
use crate::metrics::{DataSource, MetricRegistry};
use crate::query::{IdentitiesDb, QueryContext, SqliteExecutor};
use crate::report::{ReportAssembler, ReportWriter, generate};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDate};
use clap::Parser;
use ohno::{IntoAppError, bail};
use std::io::Write;

const LOG_TARGET: &str = "    report";

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Path to configuration file (default is `metrics.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory the JSON reports are written to
    #[arg(long, short = 'd', value_name = "PATH", default_value = "reports")]
    pub destination: Utf8PathBuf,

    /// Only report on these data sources (default is every configured database)
    #[arg(long = "data-source", value_name = "DATA_SOURCE")]
    pub data_sources: Vec<DataSource>,

    /// Also write one report per item of this dimension, plus a summary of all items
    #[arg(long = "filter", value_name = "DIMENSION")]
    pub filters: Vec<Dimension>,

    /// Day after the last one reported on (default is the configured end date, or today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<NaiveDate>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

pub fn generate_reports<H: Host>(host: &mut H, args: &ReportArgs) -> Result<()> {
    init_logging(args.log_level);

    let mut config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    if let Some(end_date) = args.end_date {
        config.end_date = Some(end_date);
        config.validate()?;
    }

    let databases: Vec<_> = config
        .databases()?
        .into_iter()
        .filter(|(data_source, _)| args.data_sources.is_empty() || args.data_sources.contains(data_source))
        .collect();
    if databases.is_empty() {
        bail!("no database is configured for the requested data sources");
    }

    let base = config.filters(Local::now().date_naive())?;
    let writer = ReportWriter::new(args.destination.clone())?;
    let identities = IdentitiesDb::default();

    for (data_source, path) in databases {
        if !path.exists() {
            bail!("the {data_source} database '{path}' does not exist");
        }

        let executor = SqliteExecutor::open(path)?;
        let ids = match &config.identities_db {
            Some(identities_db) => {
                executor.attach(identities_db.as_str(), &identities)?;
                Some(&identities)
            }
            None => {
                log::info!(target: LOG_TARGET, "No identities database configured, {data_source} metrics needing one are left out of unfiltered reports");
                None
            }
        };

        let ctx = QueryContext::new(&executor, ids);
        let assembler = ReportAssembler::new(MetricRegistry::new(data_source), ctx, config.settings(data_source)?);
        let written = generate(&assembler, &writer, &base, &args.filters)?;

        writeln!(
            host.output(),
            "{data_source}: wrote {} report files to {}",
            written.len(),
            writer.destination()
        )
        .into_app_err("unable to write the report summary")?;
    }

    Ok(())
}
