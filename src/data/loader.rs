//! CSV Data Loader Module
//! Handles CSV file loading and required-column checks using Polars.

use log::info;
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Cell values read as missing, on top of empty cells.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Loads the exam table. Every column is read as text so the sentinel
/// and malformed numbers reach the aggregator untouched.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file with a header row.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        // Schema inference disabled: all columns come back as String
        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_null_values(Some(NullValues::AllColumns(
                NA_TOKENS.iter().map(|t| PlSmallStr::from(*t)).collect(),
            )))
            .finish()?
            .collect()?;

        info!(
            "loaded {} ({} rows, {} columns)",
            file_path.display(),
            df.height(),
            df.width()
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Fail on the first column in `columns` the loaded table does not have.
    pub fn require_columns(&self, columns: &[&str]) -> Result<(), LoaderError> {
        if self.df.is_none() {
            return Err(LoaderError::NoData);
        }
        let present = self.get_columns();

        match columns
            .iter()
            .find(|name| !present.iter().any(|p| p == *name))
        {
            Some(missing) => Err(LoaderError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }
}
