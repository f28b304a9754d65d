//! Command dispatch logic for activity-metrics

use super::{InitArgs, MetricsArgs, ReportArgs, ValidateArgs, generate_reports, init_config, list_metrics, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "activity-metrics", author, version, long_about = None)]
#[command(about = "Compute software project activity metrics and write dashboard reports")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: MetricsSubcommand,
}

#[derive(Subcommand, Debug)]
enum MetricsSubcommand {
    /// Generate the JSON reports of the configured data sources
    Report(Box<ReportArgs>),
    /// List the available metrics
    Metrics(MetricsArgs),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        MetricsSubcommand::Report(report_args) => generate_reports(host, report_args),
        MetricsSubcommand::Metrics(metrics_args) => list_metrics(host, metrics_args),
        MetricsSubcommand::Init(init_args) => init_config(host, init_args),
        MetricsSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}
