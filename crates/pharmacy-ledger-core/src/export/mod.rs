//! CSV reports for patient records and inventory.

mod inventory;
mod records;

pub use inventory::*;
pub use records::*;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ValidationError, DATE_FORMAT};

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which report a CSV file holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportKind {
    Records,
    Inventory,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Records => "Records",
            ReportKind::Inventory => "Inventory",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{prefix}_{Records|Inventory}_{YYYY-MM-DD}.csv`
pub fn report_file_name(prefix: &str, kind: ReportKind, date: NaiveDate) -> String {
    format!("{}_{}_{}.csv", prefix, kind, date.format(DATE_FORMAT))
}

/// Write a rendered report into `dir`, returning the file path.
pub fn write_csv(
    dir: &Path,
    prefix: &str,
    kind: ReportKind,
    date: NaiveDate,
    contents: &str,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(prefix, kind, date));
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), kind = %kind, "Exported report");
    Ok(path)
}

/// Escape a string for CSV output.
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Join fields into one CSV line, escaping each.
fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| escape_csv(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}
