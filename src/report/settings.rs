use crate::Result;
use crate::metrics::DataSource;
use chrono::NaiveDate;
use core::str::FromStr;
use ohno::{IntoAppError, bail};
use std::collections::BTreeMap;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// A per data source report setting, configured as `<data source>_<setting>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Setting {
    /// Comma-separated metric ids of the evolutionary report
    MetricsTs,
    /// Comma-separated metric ids of the static report
    MetricsAgg,
    /// Comma-separated metric ids whose trends are added to the static report
    MetricsTrends,
    StartDate,
    EndDate,
}

impl Setting {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the value of the setting is a list of metric ids.
    #[must_use]
    pub const fn is_metric_list(self) -> bool {
        matches!(self, Self::MetricsTs | Self::MetricsAgg | Self::MetricsTrends)
    }
}

/// Split an override key such as `scr_metrics_agg` into its data source and setting.
pub fn parse_override_key(key: &str) -> Result<(DataSource, Setting)> {
    let Some((data_source, setting)) = key.split_once('_') else {
        bail!("override '{key}' is not of the form <data source>_<setting>");
    };

    let data_source = DataSource::from_str(data_source).into_app_err_with(|| format!("unknown data source in override '{key}'"))?;
    let setting = Setting::from_str(setting).into_app_err_with(|| format!("unknown setting in override '{key}'"))?;
    Ok((data_source, setting))
}

/// Split a comma-separated list of metric ids, ignoring blanks.
#[must_use]
pub fn metric_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Report settings of one data source.
///
/// Metric lists replace the core sets of the data source when present; dates replace
/// the configured window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSettings {
    pub metrics_ts: Option<Vec<String>>,
    pub metrics_agg: Option<Vec<String>>,
    pub metrics_trends: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    /// Optional report metrics enabled for unfiltered reports.
    pub reports: Vec<String>,
}

impl ReportSettings {
    /// Collect the settings of `data_source` from the flat override table.
    ///
    /// Overrides of other data sources are ignored; malformed keys and values are errors.
    pub fn from_overrides(data_source: DataSource, overrides: &BTreeMap<String, String>, reports: &[String]) -> Result<Self> {
        let mut settings = Self {
            reports: reports.to_vec(),
            ..Self::default()
        };

        for (key, value) in overrides {
            let (ds, setting) = parse_override_key(key)?;
            if ds != data_source {
                continue;
            }

            match setting {
                Setting::MetricsTs => settings.metrics_ts = Some(metric_list(value)),
                Setting::MetricsAgg => settings.metrics_agg = Some(metric_list(value)),
                Setting::MetricsTrends => settings.metrics_trends = Some(metric_list(value)),
                Setting::StartDate => settings.start_date = Some(parse_date(key, value)?),
                Setting::EndDate => settings.end_date = Some(parse_date(key, value)?),
            }
        }

        Ok(settings)
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim().trim_matches('\''), "%Y-%m-%d")
        .into_app_err_with(|| format!("override '{key}' must be a YYYY-MM-DD date, got '{value}'"))
}
