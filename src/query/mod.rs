//! SQL construction and execution
//!
//! Metrics never open connections or concatenate raw user input into SQL. They
//! describe what they count with a [`SqlQuery`], scope it with the [`Fragment`]
//! matching the active dimension filter, and run the rendered text through the
//! [`QueryExecutor`] held by a [`QueryContext`].
//!
//! # Implementation Model
//!
//! - **Executor**: [`QueryExecutor`] is the only seam to the database. It returns a
//!   columnar [`QueryResult`]. [`SqliteExecutor`] is the bundled implementation and
//!   attaches the identities database under its schema name.
//! - **Fragments**: [`fragment`] maps a (data source, dimension filter) pair to the
//!   extra tables and join conditions needed to scope a query. Dimensions backed by the
//!   identities database fail with a configuration error when none is attached, and
//!   combinations a data source does not support fail as unsupported.
//! - **Rendering**: [`SqlQuery`] renders either a single aggregate over the whole
//!   window or one row per period bucket, with optional grouping per item.
//!
//! Every value interpolated into SQL goes through [`sql_literal`], and schema names
//! are validated as identifiers by [`IdentitiesDb`].

mod context;
mod executor;
mod fragment;
mod literal;
mod sql_query;
mod sqlite;

#[cfg(test)]
pub(crate) mod testing;

pub use context::QueryContext;
pub use executor::{QueryExecutor, QueryResult, SqlValue};
pub use fragment::{Fragment, fragment, from_fragment, supports, where_fragment};
pub(crate) use fragment::{company_join, country_join, domain_join, people_join};
pub use literal::{IdentitiesDb, sql_literal};
pub use sql_query::SqlQuery;
pub use sqlite::SqliteExecutor;
