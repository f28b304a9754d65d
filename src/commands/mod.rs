//! Command-line interface and orchestration for activity-metrics
//!
//! This module implements the CLI commands and wires the configuration, the crawler
//! databases and the report assembly together. It handles argument parsing,
//! configuration management, and the high-level workflows.
//!
//! # Implementation Model
//!
//! The module is organized around four commands:
//!
//! ## Commands
//!
//! - **report**: Open the database of every configured data source, attach the
//!   identities database, and write the evolutionary, static, top, dimension and
//!   people reports of each data source
//! - **metrics**: List the metrics every data source offers
//! - **init**: Generate a default configuration file
//! - **validate**: Check the configuration file, including the metric ids and dates
//!   of its per data source overrides
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. The report command follows these steps:
//!
//! 1. Load and validate the configuration
//! 2. Build the unscoped filters shared by every data source
//! 3. For each data source, open its database and assemble its reports
//! 4. Write the reports as pretty-printed JSON into the destination directory
//!
//! Output goes through the [`Host`] trait so commands can be exercised in tests
//! without touching the real process environment.

mod common;
mod config;
mod host;
mod init;
mod metrics;
mod report;
mod run;
mod validate;

pub use common::LogLevel;
pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use metrics::{MetricsArgs, list_metrics};
pub use report::{ReportArgs, generate_reports};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
