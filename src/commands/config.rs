use crate::Result;
use crate::filters::{DEFAULT_NPEOPLE, DateRange, MetricFilters, Period};
use crate::metrics::{DataSource, MetricRegistry};
use crate::report::ReportSettings;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use core::str::FromStr;
use ohno::{IntoAppError, app_err};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use strum::IntoEnumIterator;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = "metrics.toml";

/// Days covered by the reports when no start date is configured
const DEFAULT_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Granularity of evolutionary reports
    #[serde(default = "default_period")]
    pub period: Period,

    /// First day covered by the reports
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Day after the last one covered by the reports
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Number of people listed in each ranking
    #[serde(default = "default_npeople")]
    pub npeople: u32,

    /// Database attached as the identities schema
    #[serde(default)]
    pub identities_db: Option<Utf8PathBuf>,

    /// Crawler database of each data source, keyed by data source name
    #[serde(default)]
    pub databases: BTreeMap<String, Utf8PathBuf>,

    /// Identifiers excluded from every ranking
    #[serde(default)]
    pub people_out: Vec<String>,

    /// Optional metrics added to unfiltered reports
    #[serde(default)]
    pub reports: Vec<String>,

    /// Per data source settings, keyed `<data source>_<setting>`
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

const fn default_period() -> Period {
    Period::Month
}

const fn default_npeople() -> u32 {
    DEFAULT_NPEOPLE
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `metrics.toml` is looked up in `base_dir` and the
    /// defaults apply when it does not exist.
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(app_err!("start_date ({start}) must not be after end_date ({end})"));
        }

        if self.npeople == 0 {
            return Err(app_err!("npeople must be greater than 0"));
        }

        let _ = self.databases()?;

        for data_source in DataSource::iter() {
            let settings = self.settings(data_source)?;
            let registry = MetricRegistry::new(data_source);

            let lists = [&settings.metrics_ts, &settings.metrics_agg, &settings.metrics_trends];
            for id in lists.into_iter().flatten().flatten() {
                if !registry.contains(id) {
                    return Err(app_err!("unknown {data_source} metric '{id}' in overrides"));
                }
            }

            if let (Some(start), Some(end)) = (settings.start_date, settings.end_date)
                && start > end
            {
                return Err(app_err!("{data_source}_start_date ({start}) must not be after {data_source}_end_date ({end})"));
            }
        }

        for id in &self.reports {
            if !DataSource::iter().any(|data_source| MetricRegistry::new(data_source).contains(id)) {
                return Err(app_err!("unknown metric '{id}' in reports"));
            }
        }

        Ok(())
    }

    /// Reporting window, ending at `today` unless configured otherwise.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        let end = self.end_date.unwrap_or(today);
        match self.start_date {
            Some(start) => DateRange::new(start, end),
            None => DateRange::trailing(end, DEFAULT_WINDOW_DAYS),
        }
    }

    /// The unscoped filters every report starts from.
    pub fn filters(&self, today: NaiveDate) -> Result<MetricFilters> {
        Ok(MetricFilters::new(self.period, self.date_range(today)?)
            .with_npeople(self.npeople)
            .with_bots(self.people_out.iter().cloned()))
    }

    /// The configured databases, in data source order.
    pub fn databases(&self) -> Result<Vec<(DataSource, &Utf8Path)>> {
        let mut databases = self
            .databases
            .iter()
            .map(|(name, path)| {
                let data_source = DataSource::from_str(name).into_app_err_with(|| format!("unknown data source '{name}' in databases"))?;
                Ok((data_source, path.as_path()))
            })
            .collect::<Result<Vec<_>>>()?;

        databases.sort_by_key(|(data_source, _)| *data_source);
        Ok(databases)
    }

    /// Report settings of `data_source`.
    pub fn settings(&self, data_source: DataSource) -> Result<ReportSettings> {
        ReportSettings::from_overrides(data_source, &self.overrides, &self.reports)
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
