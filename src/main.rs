//! Exam Report command line entry point.

use anyhow::Context;
use clap::Parser;
use exam_report::charts::StaticChartRenderer;
use exam_report::config::{FailurePolicy, ReportConfig};
use exam_report::data::FileSelector;
use exam_report::report::ReportRunner;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file. A file dialog opens when it is left out.
    csv: Option<PathBuf>,

    /// JSON config file (column names, sentinel, output directory, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the charts and CSV files are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not open the charts after writing them
    #[arg(long)]
    no_display: bool,

    /// Stop at the first failed report step
    #[arg(long)]
    fail_fast: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(ReportConfig, FileSelector)> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_json_file(path)?,
            None => ReportConfig::default(),
        };
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.no_display {
            config.display = false;
        }
        if self.fail_fast {
            config.failure_policy = FailurePolicy::Abort;
        }
        Ok((config, FileSelector::from_arg(self.csv)))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, selector) = Args::parse().into_config()?;

    let Some(csv_path) = selector.select()? else {
        // Selection cancelled: nothing to do
        return Ok(());
    };

    let renderer = StaticChartRenderer::default();
    let report = ReportRunner::new(&config, &renderer)
        .generate(&csv_path)
        .with_context(|| format!("report for {} failed", csv_path.display()))?
        .into_result()?;

    info!("done: {} files written", report.written_files().len());
    Ok(())
}
