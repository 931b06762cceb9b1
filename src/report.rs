//
// report.rs
// Rtss-Tools-rs
//
// Persists the batch summary: failure map and empty-ROI map as JSON, change log as CSV.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::models::BatchSummary;

/// Paths of the three files written for one batch run.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub errors: PathBuf,
    pub changes: PathBuf,
    pub empty_rois: PathBuf,
}

/// Timestamp used in output and report file names.
pub fn file_stamp() -> String {
    Local::now().format("%Y-%m-%d_%H_%M_%S%.6f").to_string()
}

pub fn save_summary(summary: &BatchSummary, dir: &Path, stamp: &str) -> Result<ReportFiles> {
    fs::create_dir_all(dir).context("Failed to create report directory")?;

    let files = ReportFiles {
        errors: dir.join(format!("{stamp}_batch_rtsedit_errors.json")),
        changes: dir.join(format!("{stamp}_batch_rtsedit_changes.csv")),
        empty_rois: dir.join(format!("{stamp}_batch_rtsedit_empty_rois.json")),
    };

    write_json(&files.errors, &summary.failures)?;
    write_changes(&files.changes, summary)?;
    write_json(&files.empty_rois, &summary.empty_rois)?;

    tracing::info!(dir = %dir.display(), "Batch reports written");
    Ok(files)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_changes(path: &Path, summary: &BatchSummary) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in &summary.changes {
        writer.write_record([record.case_id.as_str(), record.description().as_str()])?;
    }
    writer.flush().context("Failed to flush change log")?;
    Ok(())
}
