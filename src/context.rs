use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::ProblemReporter;

/// Everything one job invocation owns: the run timestamp, its log
/// directory, and the problems sheet. Built once in `main` and passed
/// explicitly; nothing here is shared between runs.
pub struct RunContext {
    pub job_name: &'static str,
    pub stamp: String,
    pub log_dir: PathBuf,
    pub reporter: ProblemReporter,
}

impl RunContext {
    pub fn create(root: &Path, job_name: &'static str, with_name_column: bool) -> Result<Self> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_dir = root.join("jobs").join(job_name);
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
        let problems_path = log_dir.join(format!("{}_{}_problems.csv", job_name, stamp));
        let reporter = ProblemReporter::create(&problems_path, with_name_column)?;
        info!("Problems sheet for this run: {}", problems_path.display());
        Ok(Self {
            job_name,
            stamp,
            log_dir,
            reporter,
        })
    }
}
