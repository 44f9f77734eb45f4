//! Asynchronous CSV export jobs.
//!
//! `submit` validates the destination up front, then writes the table on a
//! background thread and hands back a `JobHandle`. The caller may `wait()` on
//! the handle or drop it for fire-and-forget submission; the two pipeline
//! exports carry no mutual ordering. Submission problems (unwritable output
//! directory) surface immediately; write failures surface through the handle.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use log::info;
use serde::Deserialize;

use crate::error::{Result, TrailEnvError};
use crate::table::ResultTable;

#[derive(Debug, Clone, Deserialize)]
pub struct ExportSpec {
    /// Job description; also the output file stem.
    pub description: String,
    pub output_dir: PathBuf,
}

impl ExportSpec {
    pub fn new(description: &str, output_dir: impl Into<PathBuf>) -> Self {
        Self { description: description.to_string(), output_dir: output_dir.into() }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.description))
    }
}

/// What a finished export job reports back.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub description: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Handle to a running export job.
pub struct JobHandle {
    description: String,
    handle: JoinHandle<Result<ExportReport>>,
}

impl JobHandle {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the job completes and return its report.
    pub fn wait(self) -> Result<ExportReport> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(TrailEnvError::JobPanicked(self.description)),
        }
    }
}

/// Submit a table for CSV export. The table carries no geometry by
/// construction, so the written file is the flat attribute/statistics table.
pub fn submit(table: ResultTable, spec: ExportSpec) -> Result<JobHandle> {
    fs::create_dir_all(&spec.output_dir)?;
    let path = spec.output_path();
    let description = spec.description.clone();
    info!("export job {description:?}: {} row(s) -> {}", table.len(), path.display());

    let job_description = description.clone();
    let handle = thread::spawn(move || {
        let write = || -> Result<ExportReport> {
            let file = File::create(&path)?;
            table.write_csv(BufWriter::new(file))?;
            Ok(ExportReport { description: job_description.clone(), path: path.clone(), rows: table.len() })
        };
        write().map_err(|e| TrailEnvError::ExportFailed(job_description.clone(), e.to_string()))
    });

    Ok(JobHandle { description, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> ResultTable {
        let mut t = ResultTable::new(vec!["id".into(), "ndvi_mean".into()]);
        t.rows.push(vec![json!("seg-1"), json!(0.4)]);
        t.rows.push(vec![json!("seg-2"), json!(0.6)]);
        t
    }

    #[test]
    fn submitted_job_writes_csv_and_reports_rows() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ExportSpec::new("explan_vars_continuous", dir.path());
        let report = submit(table(), spec).unwrap().wait().unwrap();
        assert_eq!(report.rows, 2);

        let text = fs::read_to_string(&report.path).unwrap();
        assert!(text.starts_with("id,ndvi_mean"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn output_file_is_named_after_the_description() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ExportSpec::new("explan_vars_categorical", dir.path());
        assert!(spec.output_path().ends_with("explan_vars_categorical.csv"));
        let report = submit(table(), spec).unwrap().wait().unwrap();
        assert!(report.path.exists());
    }

    #[test]
    fn missing_output_dir_is_created_at_submit_time() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let report = submit(table(), ExportSpec::new("t", &nested)).unwrap().wait().unwrap();
        assert!(report.path.starts_with(&nested));
    }
}
