//! Report Configuration Module
//! Column names, sentinel, output location and failure policy for one run.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder marking a missing observation in any column.
pub const DEFAULT_SENTINEL: &str = "-";

pub const GENDER_CHART_FILE: &str = "genero.png";
pub const EDUCATION_CHART_FILE: &str = "educacion_padres.png";
pub const DEPARTMENT_CHART_FILE: &str = "promedio_departamentos.png";
pub const GENDER_COUNTS_FILE: &str = "genero_counts.csv";
pub const EDUCATION_COUNTS_FILE: &str = "educacion_padres_counts.csv";
pub const DEPARTMENT_AVERAGES_FILE: &str = "promedio_departamentos.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What happens to the remaining units once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and keep going with the next unit.
    #[default]
    Continue,
    /// Stop the run at the first failed unit.
    Abort,
}

/// Input column names. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub gender: String,
    pub father_education: String,
    pub score: String,
    pub department: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            gender: "ESTU_GENERO".to_string(),
            father_education: "FAMI_EDUCACIONPADRE".to_string(),
            score: "PUNT_GLOBAL".to_string(),
            department: "ESTU_DEPTO_RESIDE".to_string(),
        }
    }
}

impl ColumnNames {
    /// Every column the report reads, in the order the units use them.
    pub fn required(&self) -> [&str; 4] {
        [
            self.gender.as_str(),
            self.father_education.as_str(),
            self.score.as_str(),
            self.department.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub columns: ColumnNames,
    pub sentinel: String,
    pub output_dir: PathBuf,
    /// Open every chart with the system viewer once it is written.
    pub display: bool,
    pub failure_policy: FailurePolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            output_dir: PathBuf::from("."),
            display: true,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ReportConfig {
    /// Load a JSON config file. Keys left out keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
