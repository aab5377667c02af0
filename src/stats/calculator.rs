//! Statistics Calculator Module
//! Category counts and per-group score averages over the exam table.

use log::debug;
use polars::prelude::*;
use statrs::statistics::Statistics;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Occurrences of each distinct value of one column, most frequent first.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyCount {
    pub column: String,
    entries: Vec<(String, u64)>,
}

impl FrequencyCount {
    pub fn new(column: &str, entries: Vec<(String, u64)>) -> Self {
        Self {
            column: column.to_string(),
            entries,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(label, count)| (label.as_str(), *count))
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.iter().find(|(l, _)| *l == label).map(|(_, c)| c)
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.clone()).collect()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.entries.iter().map(|(_, count)| *count).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mean of a value column per group key, lowest mean first.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMean {
    pub key_column: String,
    pub value_column: String,
    entries: Vec<(String, f64)>,
}

impl GroupedMean {
    pub fn new(key_column: &str, value_column: &str, entries: Vec<(String, f64)>) -> Self {
        Self {
            key_column: key_column.to_string(),
            value_column: value_column.to_string(),
            entries,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(key, mean)| (key.as_str(), *mean))
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.iter().find(|(k, _)| *k == key).map(|(_, m)| m)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// First group, in iteration order, holding the highest mean.
    pub fn max_group(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(key, _)| key.as_str())
    }

    /// First group, in iteration order, holding the lowest mean.
    pub fn min_group(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 < b.1) {
                best = Some(entry);
            }
        }
        best.map(|(key, _)| key.as_str())
    }

    /// Unweighted mean of the group means. NaN when there are no groups.
    pub fn mean_of_means(&self) -> f64 {
        if self.entries.is_empty() {
            return f64::NAN;
        }
        self.entries.iter().map(|(_, mean)| *mean).mean()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the department chart needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentSummary {
    pub means: GroupedMean,
    pub max_group: Option<String>,
    pub min_group: Option<String>,
    /// Mean of the group means, drawn as the reference line.
    pub overall_average: f64,
    /// Mean over every qualifying row. Differs from `overall_average`
    /// whenever group sizes differ.
    pub row_weighted_mean: f64,
}

/// Handles the exam aggregations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Count distinct values of `column`, skipping the sentinel and nulls.
    ///
    /// Ordered by descending count; equal counts keep the order in which
    /// the values first appear in the table.
    pub fn frequency_count(
        df: &DataFrame,
        column: &str,
        sentinel: &str,
    ) -> Result<FrequencyCount, StatsError> {
        let text = Self::text_column(df, column)?;

        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<(String, u64)> = Vec::new();

        for value in (&text).into_iter().flatten() {
            if value == sentinel {
                continue;
            }
            match positions.get(value) {
                Some(&pos) => entries[pos].1 += 1,
                None => {
                    positions.insert(value, entries.len());
                    entries.push((value.to_string(), 1));
                }
            }
        }

        // Stable sort keeps first-seen order among ties
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        debug!("{}: {} distinct values", column, entries.len());
        Ok(FrequencyCount::new(column, entries))
    }

    /// Mean of `value_col` per `key_col`, lowest first.
    ///
    /// Rows whose raw value is the sentinel are dropped first; what is left
    /// is trimmed, cast to Float64 and anything that does not parse is
    /// treated as missing. Groups without a single usable value are left out.
    /// Also returns the plain mean of every usable value.
    pub fn grouped_mean(
        df: &DataFrame,
        key_col: &str,
        value_col: &str,
        sentinel: &str,
    ) -> Result<(GroupedMean, f64), StatsError> {
        let keys = Self::text_column(df, key_col)?;
        let raw_values = Self::text_column(df, value_col)?;
        // Padded cells like " 250" still count as numbers
        let trimmed: StringChunked = (&raw_values)
            .into_iter()
            .map(|raw| raw.map(str::trim))
            .collect();
        let numeric = trimmed.into_series().cast(&DataType::Float64)?;
        let numeric = numeric.f64()?;

        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        let mut all_values: Vec<f64> = Vec::new();

        for ((key, raw), value) in (&keys)
            .into_iter()
            .zip(&raw_values)
            .zip(numeric)
        {
            let (Some(key), Some(raw)) = (key, raw) else {
                continue;
            };
            if raw == sentinel {
                continue;
            }
            let Some(value) = value.filter(|v| !v.is_nan()) else {
                continue;
            };

            match positions.get(key) {
                Some(&pos) => groups[pos].1.push(value),
                None => {
                    positions.insert(key, groups.len());
                    groups.push((key.to_string(), vec![value]));
                }
            }
            all_values.push(value);
        }

        let mut entries: Vec<(String, f64)> = groups
            .into_iter()
            .map(|(key, values)| {
                let mean = values.iter().mean();
                (key, mean)
            })
            .collect();
        entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let row_weighted = if all_values.is_empty() {
            f64::NAN
        } else {
            all_values.iter().mean()
        };

        debug!(
            "{} by {}: {} groups from {} values",
            value_col,
            key_col,
            entries.len(),
            all_values.len()
        );
        Ok((GroupedMean::new(key_col, value_col, entries), row_weighted))
    }

    /// Per-department score means with the highlighted extremes and the
    /// overall average line.
    pub fn department_summary(
        df: &DataFrame,
        department_col: &str,
        score_col: &str,
        sentinel: &str,
    ) -> Result<DepartmentSummary, StatsError> {
        let (means, row_weighted_mean) =
            Self::grouped_mean(df, department_col, score_col, sentinel)?;

        Ok(DepartmentSummary {
            max_group: means.max_group().map(str::to_string),
            min_group: means.min_group().map(str::to_string),
            overall_average: means.mean_of_means(),
            row_weighted_mean,
            means,
        })
    }

    /// Column as text, whatever dtype it was loaded with.
    fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked, StatsError> {
        let column = df
            .column(name)
            .map_err(|_| StatsError::MissingColumn(name.to_string()))?;
        let text = column.cast(&DataType::String)?;
        Ok(text.str()?.clone())
    }
}
