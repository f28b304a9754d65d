//! Report assembly and JSON output
//!
//! This module turns metric results into the files a dashboard reads: one evolutionary
//! and one static report per data source, a top report of ranked people, and reports
//! scoped to each item of the requested dimensions. Code review additionally gets
//! its people and organizations ranked per quarter by [`QuartersReport`].
//!
//! # Implementation Model
//!
//! A [`ReportAssembler`] owns the registry, query context and [`ReportSettings`] of
//! one data source. Each report is produced in the same way:
//! - The metrics are selected from the core sets of the data source or the configured
//!   overrides, minus those that make no sense under a dimension filter
//! - Every metric is evaluated against one filter snapshot
//! - Grouped results are aligned on the item catalogue, with zero series or `NA`
//!   standing in for items without activity
//! - The results are merged into a single [`MetricResult`](crate::metrics::MetricResult)
//!
//! A metric that fails is logged and left out of its report. Under a dimension filter,
//! configuration errors such as a missing identities database abort the report instead.
//!
//! [`generate`] drives an assembler over every report of a data source and hands the
//! results to a [`ReportWriter`], which names the files and pretty-prints them.

mod assembler;
mod generate;
mod quarters;
mod settings;
mod top;
mod writer;

pub use assembler::{ReportAssembler, TREND_WINDOWS};
pub use generate::generate;
pub use quarters::{QUARTER_LIMIT, QuartersReport};
pub use settings::{ReportSettings, Setting, metric_list, parse_override_key};
pub use top::TopReport;
pub use writer::{ReportKind, ReportWriter, item_file, item_file_name, person_file, report_file, summary_file, top_file};
