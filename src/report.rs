//! Report pipeline
//! Load the exam table, then run the three aggregate/render/save units.
//!
//! Every unit is handled the same way when it fails: with
//! `FailurePolicy::Continue` the failure is logged and the next unit runs,
//! with `FailurePolicy::Abort` the run stops there.

use crate::charts::{ChartError, ChartPainter, ChartViewer};
use crate::config::{
    FailurePolicy, ReportConfig, DEPARTMENT_AVERAGES_FILE, DEPARTMENT_CHART_FILE,
    EDUCATION_CHART_FILE, EDUCATION_COUNTS_FILE, GENDER_CHART_FILE, GENDER_COUNTS_FILE,
};
use crate::data::{DataLoader, LoaderError};
use crate::export::{CsvExporter, ExportError};
use crate::stats::{StatsCalculator, StatsError};
use log::{error, info, warn};
use polars::prelude::DataFrame;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const GENDER_TITLE: &str = "Gender Distribution";
pub const EDUCATION_TITLE: &str = "Father's Education Level";

/// One aggregate → render → save step of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportUnit {
    Gender,
    FatherEducation,
    DepartmentAverages,
}

impl ReportUnit {
    pub const ALL: [ReportUnit; 3] = [
        ReportUnit::Gender,
        ReportUnit::FatherEducation,
        ReportUnit::DepartmentAverages,
    ];

    pub fn chart_file(self) -> &'static str {
        match self {
            ReportUnit::Gender => GENDER_CHART_FILE,
            ReportUnit::FatherEducation => EDUCATION_CHART_FILE,
            ReportUnit::DepartmentAverages => DEPARTMENT_CHART_FILE,
        }
    }

    pub fn data_file(self) -> &'static str {
        match self {
            ReportUnit::Gender => GENDER_COUNTS_FILE,
            ReportUnit::FatherEducation => EDUCATION_COUNTS_FILE,
            ReportUnit::DepartmentAverages => DEPARTMENT_AVERAGES_FILE,
        }
    }
}

impl fmt::Display for ReportUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportUnit::Gender => "gender distribution",
            ReportUnit::FatherEducation => "father education",
            ReportUnit::DepartmentAverages => "department averages",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum UnitError {
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("{unit} failed: {source}")]
    Unit {
        unit: ReportUnit,
        #[source]
        source: UnitError,
    },
    #[error("report steps failed: {}", join_units(.failed))]
    UnitsFailed { failed: Vec<ReportUnit> },
}

fn join_units(units: &[ReportUnit]) -> String {
    units
        .iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of one unit: the files it wrote, or why it stopped.
#[derive(Debug)]
pub struct UnitOutcome {
    pub unit: ReportUnit,
    pub result: Result<Vec<PathBuf>, UnitError>,
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl RunReport {
    pub fn written_files(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn failed_units(&self) -> Vec<ReportUnit> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.unit)
            .collect()
    }

    /// `Err` naming the failed units when any unit failed.
    pub fn into_result(self) -> Result<Self, ReportError> {
        let failed = self.failed_units();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(ReportError::UnitsFailed { failed })
        }
    }
}

/// Runs the report units against a loaded table.
pub struct ReportRunner<'a, P: ChartPainter> {
    config: &'a ReportConfig,
    painter: &'a P,
    viewer: ChartViewer,
}

impl<'a, P: ChartPainter> ReportRunner<'a, P> {
    pub fn new(config: &'a ReportConfig, painter: &'a P) -> Self {
        Self {
            config,
            painter,
            viewer: ChartViewer::new(config.display),
        }
    }

    /// Load `csv_path`, check the required columns, then run every unit.
    ///
    /// Load and column errors stop the run before anything is written.
    pub fn generate(&self, csv_path: &Path) -> Result<RunReport, ReportError> {
        let mut loader = DataLoader::new();
        loader.load_csv(csv_path)?;
        loader.require_columns(&self.config.columns.required())?;

        let df = loader.get_dataframe().ok_or(LoaderError::NoData)?;
        self.run(df)
    }

    /// Run the units in order under the configured failure policy.
    pub fn run(&self, df: &DataFrame) -> Result<RunReport, ReportError> {
        let mut report = RunReport::default();

        for unit in ReportUnit::ALL {
            match self.run_unit(unit, df) {
                Ok(files) => report.outcomes.push(UnitOutcome {
                    unit,
                    result: Ok(files),
                }),
                Err(e) => {
                    error!("{} failed: {}", unit, e);
                    if self.config.failure_policy == FailurePolicy::Abort {
                        return Err(ReportError::Unit { unit, source: e });
                    }
                    report.outcomes.push(UnitOutcome {
                        unit,
                        result: Err(e),
                    });
                }
            }
        }

        Ok(report)
    }

    fn run_unit(&self, unit: ReportUnit, df: &DataFrame) -> Result<Vec<PathBuf>, UnitError> {
        let columns = &self.config.columns;
        let sentinel = self.config.sentinel.as_str();
        let chart_path = self.config.output_path(unit.chart_file());
        let data_path = self.config.output_path(unit.data_file());

        match unit {
            ReportUnit::Gender => {
                let counts = StatsCalculator::frequency_count(df, &columns.gender, sentinel)?;
                let drawn = self.painter.bar_chart(&counts, GENDER_TITLE, &chart_path);
                self.finish_chart(&chart_path, drawn)?;
                CsvExporter::save_counts(&counts, &data_path)?;
            }
            ReportUnit::FatherEducation => {
                let counts =
                    StatsCalculator::frequency_count(df, &columns.father_education, sentinel)?;
                let drawn = self.painter.pie_chart(&counts, EDUCATION_TITLE, &chart_path);
                self.finish_chart(&chart_path, drawn)?;
                CsvExporter::save_counts(&counts, &data_path)?;
            }
            ReportUnit::DepartmentAverages => {
                let summary = StatsCalculator::department_summary(
                    df,
                    &columns.department,
                    &columns.score,
                    sentinel,
                )?;
                info!(
                    "overall average {:.2} over {} departments (highest: {}, lowest: {})",
                    summary.overall_average,
                    summary.means.len(),
                    summary.max_group.as_deref().unwrap_or("-"),
                    summary.min_group.as_deref().unwrap_or("-"),
                );
                let drawn = self.painter.department_chart(&summary, &chart_path);
                self.finish_chart(&chart_path, drawn)?;
                CsvExporter::save_means(&summary.means, &data_path)?;
            }
        }

        Ok(vec![chart_path, data_path])
    }

    /// A failed render can still leave a partial bitmap behind (the backend
    /// flushes on drop), so it is removed before the error is returned.
    fn finish_chart(&self, path: &Path, drawn: Result<(), ChartError>) -> Result<(), ChartError> {
        if let Err(e) = drawn {
            if path.exists() {
                if let Err(io) = fs::remove_file(path) {
                    warn!("could not remove partial chart {}: {}", path.display(), io);
                }
            }
            return Err(e);
        }
        info!("saved chart to {}", path.display());
        self.viewer.show(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{DepartmentSummary, FrequencyCount};
    use std::cell::RefCell;
    use std::fs;
    use std::io::Write;

    /// Writes a stub file per chart and fails on request.
    #[derive(Default)]
    struct StubPainter {
        fail_on: Option<ReportUnit>,
        skip_writes: bool,
        painted: RefCell<Vec<ReportUnit>>,
    }

    impl StubPainter {
        fn failing(unit: ReportUnit) -> Self {
            Self {
                fail_on: Some(unit),
                ..Self::default()
            }
        }

        fn paint(&self, unit: ReportUnit, path: &Path) -> Result<(), ChartError> {
            self.painted.borrow_mut().push(unit);
            if self.fail_on == Some(unit) {
                // Mimic a backend that flushes what it drew before failing
                let _ = fs::write(path, b"partial");
                return Err(ChartError::Drawing("backend unavailable".to_string()));
            }
            if self.skip_writes {
                return Ok(());
            }
            fs::write(path, b"png").map_err(|e| ChartError::Drawing(e.to_string()))
        }
    }

    impl ChartPainter for StubPainter {
        fn bar_chart(&self, _: &FrequencyCount, _: &str, path: &Path) -> Result<(), ChartError> {
            self.paint(ReportUnit::Gender, path)
        }

        fn pie_chart(&self, _: &FrequencyCount, _: &str, path: &Path) -> Result<(), ChartError> {
            self.paint(ReportUnit::FatherEducation, path)
        }

        fn department_chart(&self, _: &DepartmentSummary, path: &Path) -> Result<(), ChartError> {
            self.paint(ReportUnit::DepartmentAverages, path)
        }
    }

    const STUDENTS: &str = "\
ESTU_GENERO,FAMI_EDUCACIONPADRE,PUNT_GLOBAL,ESTU_DEPTO_RESIDE
F,Primaria,10,A
F,-,20,A
-,Postgrado,-,B
M,Primaria,30,B
";

    fn setup(csv: &str, policy: FailurePolicy) -> (tempfile::TempDir, PathBuf, ReportConfig) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("students.csv");
        let mut file = fs::File::create(&input).unwrap();
        write!(file, "{}", csv).unwrap();

        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let config = ReportConfig {
            output_dir: out,
            display: false,
            failure_policy: policy,
            ..ReportConfig::default()
        };
        (dir, input, config)
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn full_run_writes_all_outputs() {
        let (_dir, input, config) = setup(STUDENTS, FailurePolicy::Continue);
        let painter = StubPainter::default();
        let report = ReportRunner::new(&config, &painter)
            .generate(&input)
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(report.written_files().len(), 6);
        for unit in ReportUnit::ALL {
            assert!(config.output_path(unit.chart_file()).exists());
            assert!(config.output_path(unit.data_file()).exists());
        }

        assert_eq!(
            read_lines(&config.output_path(GENDER_COUNTS_FILE)),
            vec!["ESTU_GENERO,count", "F,2", "M,1"]
        );
        assert_eq!(
            read_lines(&config.output_path(EDUCATION_COUNTS_FILE)),
            vec!["FAMI_EDUCACIONPADRE,count", "Primaria,2", "Postgrado,1"]
        );
        let averages = read_lines(&config.output_path(DEPARTMENT_AVERAGES_FILE));
        assert_eq!(averages[0], "ESTU_DEPTO_RESIDE,PUNT_GLOBAL");
        assert!(averages[1].starts_with("A,15"));
        assert!(averages[2].starts_with("B,30"));
    }

    #[test]
    fn continue_policy_runs_remaining_units() {
        let (_dir, input, config) = setup(STUDENTS, FailurePolicy::Continue);
        let painter = StubPainter::failing(ReportUnit::FatherEducation);
        let report = ReportRunner::new(&config, &painter).generate(&input).unwrap();

        assert_eq!(*painter.painted.borrow(), ReportUnit::ALL.to_vec());
        assert_eq!(report.failed_units(), vec![ReportUnit::FatherEducation]);
        assert!(!config.output_path(EDUCATION_COUNTS_FILE).exists());
        assert!(config.output_path(DEPARTMENT_AVERAGES_FILE).exists());

        match report.into_result() {
            Err(ReportError::UnitsFailed { failed }) => {
                assert_eq!(failed, vec![ReportUnit::FatherEducation])
            }
            other => panic!("expected failed units, got {other:?}"),
        }
    }

    #[test]
    fn failed_chart_leaves_no_file_behind() {
        let (_dir, input, config) = setup(STUDENTS, FailurePolicy::Continue);
        let painter = StubPainter::failing(ReportUnit::DepartmentAverages);
        let report = ReportRunner::new(&config, &painter).generate(&input).unwrap();

        assert!(!config.output_path(DEPARTMENT_CHART_FILE).exists());
        assert!(config.output_path(GENDER_CHART_FILE).exists());
        assert!(!report
            .written_files()
            .iter()
            .any(|p| p.ends_with(DEPARTMENT_CHART_FILE)));
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let (_dir, input, config) = setup(STUDENTS, FailurePolicy::Abort);
        let painter = StubPainter::failing(ReportUnit::Gender);
        let result = ReportRunner::new(&config, &painter).generate(&input);

        assert!(matches!(
            result,
            Err(ReportError::Unit {
                unit: ReportUnit::Gender,
                source: UnitError::Chart(_)
            })
        ));
        assert_eq!(*painter.painted.borrow(), vec![ReportUnit::Gender]);
        assert!(fs::read_dir(&config.output_dir).unwrap().next().is_none());
    }

    #[test]
    fn save_failure_is_a_unit_failure() {
        let (_dir, input, mut config) = setup(STUDENTS, FailurePolicy::Continue);
        config.output_dir = config.output_dir.join("gone");
        let painter = StubPainter {
            skip_writes: true,
            ..StubPainter::default()
        };
        let report = ReportRunner::new(&config, &painter).generate(&input).unwrap();

        assert_eq!(report.failed_units(), ReportUnit::ALL.to_vec());
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Err(UnitError::Export(ExportError::Io { .. })))));
        assert!(report.written_files().is_empty());
    }

    #[test]
    fn missing_column_stops_before_any_output() {
        let csv = "ESTU_GENERO,FAMI_EDUCACIONPADRE,PUNT_GLOBAL\nF,Primaria,10\n";
        let (_dir, input, config) = setup(csv, FailurePolicy::Continue);
        let painter = StubPainter::default();
        let result = ReportRunner::new(&config, &painter).generate(&input);

        match result {
            Err(ReportError::Load(LoaderError::MissingColumn(name))) => {
                assert_eq!(name, "ESTU_DEPTO_RESIDE")
            }
            other => panic!("expected missing column, got {other:?}"),
        }
        assert!(painter.painted.borrow().is_empty());
        assert!(fs::read_dir(&config.output_dir).unwrap().next().is_none());
    }

    #[test]
    fn unreadable_input_is_a_load_failure() {
        let (dir, _input, config) = setup(STUDENTS, FailurePolicy::Continue);
        let painter = StubPainter::default();
        let result = ReportRunner::new(&config, &painter).generate(&dir.path().join("absent.csv"));

        assert!(matches!(result, Err(ReportError::Load(LoaderError::CsvError(_)))));
        assert!(painter.painted.borrow().is_empty());
    }

    #[test]
    fn unit_error_names_the_unit() {
        let err = ReportError::UnitsFailed {
            failed: vec![ReportUnit::Gender, ReportUnit::DepartmentAverages],
        };
        assert_eq!(
            err.to_string(),
            "report steps failed: gender distribution, department averages"
        );
    }
}
