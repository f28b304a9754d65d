use crate::Result;
use crate::filters::Dimension;
use crate::metrics::DataSource;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::IntoAppError;
use std::fs;

const LOG_TARGET: &str = "    writer";

/// Writes report files into a destination directory.
///
/// Each file is serialized in full before anything is written, so a failing report
/// never leaves a partial file behind.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    destination: Utf8PathBuf,
}

impl ReportWriter {
    /// Create a writer, creating `destination` if needed.
    pub fn new(destination: impl Into<Utf8PathBuf>) -> Result<Self> {
        let destination = destination.into();
        fs::create_dir_all(&destination).into_app_err_with(|| format!("creating report directory '{destination}'"))?;
        Ok(Self { destination })
    }

    #[must_use]
    pub fn destination(&self) -> &Utf8Path {
        &self.destination
    }

    /// Pretty-print `data` into `file_name`, returning the path written.
    pub fn write(&self, file_name: &str, data: &serde_json::Value) -> Result<Utf8PathBuf> {
        let path = self.destination.join(file_name);
        let text = serde_json::to_string_pretty(data).into_app_err_with(|| format!("serializing '{file_name}'"))?;
        fs::write(&path, text).into_app_err_with(|| format!("writing report '{path}'"))?;

        log::info!(target: LOG_TARGET, "Wrote {path}");
        Ok(path)
    }
}

/// Kind of report held by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// One value per period bucket
    Evolutionary,
    /// One value over the whole window
    Static,
}

impl ReportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evolutionary => "evolutionary",
            Self::Static => "static",
        }
    }
}

/// `<ds>-evolutionary.json` or `<ds>-static.json`
#[must_use]
pub fn report_file(data_source: DataSource, kind: ReportKind) -> String {
    format!("{data_source}-{}.json", kind.as_str())
}

#[must_use]
pub fn top_file(data_source: DataSource) -> String {
    format!("{data_source}-top.json")
}

/// Summary of every item of a dimension, such as `scr-repos.json`.
#[must_use]
pub fn summary_file(data_source: DataSource, dimension: Dimension) -> String {
    format!("{data_source}-{}.json", dimension.plural())
}

/// Report of one item, such as `gerrit.example.org_libfoo-scr-rep-static.json`.
#[must_use]
pub fn item_file(item: &str, data_source: DataSource, dimension: Dimension, kind: ReportKind) -> String {
    format!("{}-{data_source}-{}-{}.json", item_file_name(item), dimension.file_tag(), kind.as_str())
}

#[must_use]
pub fn person_file(id: &str, data_source: DataSource, kind: ReportKind) -> String {
    format!("people-{}-{data_source}-{}.json", item_file_name(id), kind.as_str())
}

/// Item names appear in file names with their path separators replaced.
#[must_use]
pub fn item_file_name(item: &str) -> String {
    item.replace('/', "_")
}
