//! Input file selection: a path given up front, or the native file dialog.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Input file is not a .csv file: {0}")]
    NotCsv(PathBuf),
}

/// Where the input CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelector {
    /// Path resolved before the run, e.g. from the command line.
    Given(PathBuf),
    /// Blocking native open dialog restricted to CSV files.
    Dialog,
}

impl FileSelector {
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => FileSelector::Given(path),
            None => FileSelector::Dialog,
        }
    }

    /// Resolve the input path. `Ok(None)` means the user cancelled.
    pub fn select(&self) -> Result<Option<PathBuf>, SelectorError> {
        match self {
            FileSelector::Given(path) => Self::check(path).map(Some),
            FileSelector::Dialog => Ok(rfd::FileDialog::new()
                .set_title("Select CSV file")
                .add_filter("CSV Files", &["csv"])
                .pick_file()),
        }
    }

    fn check(path: &Path) -> Result<PathBuf, SelectorError> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(SelectorError::NotCsv(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(SelectorError::NotFound(path.to_path_buf()));
        }
        Ok(path.to_path_buf())
    }
}
