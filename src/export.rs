//! CSV Export Module
//! Writes computed summaries back out as two-column CSV files.

use crate::data::{DataLoader, LoaderError};
use crate::stats::{FrequencyCount, GroupedMean};
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header of the count column in persisted frequency tables.
pub const COUNT_HEADER: &str = "count";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Expected two columns in {0}")]
    Layout(PathBuf),
}

/// Persists summaries as CSV, overwriting any previous file.
pub struct CsvExporter;

impl CsvExporter {
    /// `<column>,count` frame in the order of `counts`.
    pub fn counts_frame(counts: &FrequencyCount) -> Result<DataFrame, ExportError> {
        let (labels, values): (Vec<&str>, Vec<u64>) = counts.iter().unzip();
        let df = DataFrame::new(vec![
            Column::new(counts.column.as_str().into(), labels),
            Column::new(COUNT_HEADER.into(), values),
        ])?;
        Ok(df)
    }

    /// `<key>,<value>` frame in the order of `means`.
    pub fn means_frame(means: &GroupedMean) -> Result<DataFrame, ExportError> {
        let (keys, values): (Vec<&str>, Vec<f64>) = means.iter().unzip();
        let df = DataFrame::new(vec![
            Column::new(means.key_column.as_str().into(), keys),
            Column::new(means.value_column.as_str().into(), values),
        ])?;
        Ok(df)
    }

    pub fn save_counts(counts: &FrequencyCount, path: &Path) -> Result<(), ExportError> {
        let mut df = Self::counts_frame(counts)?;
        Self::write_frame(&mut df, path)?;
        info!("saved {} counts to {}", counts.column, path.display());
        Ok(())
    }

    pub fn save_means(means: &GroupedMean, path: &Path) -> Result<(), ExportError> {
        let mut df = Self::means_frame(means)?;
        Self::write_frame(&mut df, path)?;
        info!(
            "saved {} averages by {} to {}",
            means.value_column,
            means.key_column,
            path.display()
        );
        Ok(())
    }

    /// Read a file written by [`CsvExporter::save_counts`].
    pub fn read_counts(path: &Path) -> Result<FrequencyCount, ExportError> {
        let mut loader = DataLoader::new();
        let df = loader.load_csv(path)?;

        let [label_col, count_col] = df.get_columns() else {
            return Err(ExportError::Layout(path.to_path_buf()));
        };
        let labels = label_col.str()?;
        let counts = count_col.cast(&DataType::UInt64)?;
        let counts = counts.u64()?;

        let entries = labels
            .into_iter()
            .zip(counts)
            .filter_map(|(label, count)| Some((label?.to_string(), count?)))
            .collect();
        Ok(FrequencyCount::new(label_col.name().as_str(), entries))
    }

    fn write_frame(df: &mut DataFrame, path: &Path) -> Result<(), ExportError> {
        let mut file = File::create(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        Ok(())
    }
}
