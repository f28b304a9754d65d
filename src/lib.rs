#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for activity-metrics
//!
//! This library computes software project activity metrics (commits, code reviews,
//! releases, downloads) from crawler-populated databases and assembles them into the
//! evolutionary, static and top JSON reports consumed by a dashboard.
//!
//! # Module Organization
//!
//! - [`filters`]: Reporting periods, date ranges and dimension filters
//! - [`query`]: SQL fragment building and query execution
//! - [`metrics`]: Metric definitions and the per data source registries
//! - [`report`]: Report assembly and JSON output
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod filters;
pub mod metrics;
pub mod query;
pub mod report;

pub use crate::commands::{Host, run};
