//
// anonymize.rs
// Rtss-Tools-rs
//
// Runs the DicomEdit anonymisation script over edited files, optionally stamping series date and time.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use regex::Regex;

use crate::error::ToolError;
use crate::tool::{self, ToolOutput};

static ERROR: LazyLock<Regex> = LazyLock::new(|| tool::word_pattern("error"));

/// Rewrites the header of a DICOM file in place.
#[async_trait]
pub trait Anonymizer: Send + Sync {
    async fn anonymize(&self, file: &Path) -> Result<ToolOutput, ToolError>;
}

/// `java -jar dicom-edit.jar -s <script> -i <file> -o <file>`.
#[derive(Debug, Clone)]
pub struct DicomEdit {
    pub java: PathBuf,
    pub jar: PathBuf,
    pub script: PathBuf,
    pub timeout: Duration,
}

impl DicomEdit {
    pub fn arguments(&self, file: &Path) -> Vec<String> {
        vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            "-s".to_string(),
            self.script.display().to_string(),
            "-i".to_string(),
            file.display().to_string(),
            "-o".to_string(),
            file.display().to_string(),
        ]
    }
}

#[async_trait]
impl Anonymizer for DicomEdit {
    async fn anonymize(&self, file: &Path) -> Result<ToolOutput, ToolError> {
        let args = self.arguments(file);
        let output = tool::run_tool(self.java.as_os_str(), &args, self.timeout).await?;
        check_output(&self.jar, output)
    }
}

/// A run fails when it exits non-zero or reports an error on stderr.
fn check_output(jar: &Path, output: ToolOutput) -> Result<ToolOutput, ToolError> {
    let stderr = output.stderr.trim();
    if !output.succeeded() || ERROR.is_match(stderr) {
        let message = if stderr.is_empty() {
            output.exit_description()
        } else {
            stderr.to_string()
        };
        return Err(ToolError::Reported {
            program: jar.display().to_string(),
            message,
        });
    }
    Ok(output)
}

/// Copy `script` to `destination` with Series Date and Series Time assignments for `when` appended.
pub fn stamp_series_datetime(script: &Path, destination: &Path, when: NaiveDateTime) -> Result<PathBuf> {
    let mut content = fs::read_to_string(script)
        .with_context(|| format!("Failed to read anonymisation script {}", script.display()))?;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format!(
        "(0008,0021) := \"{}\" // Series Date\n",
        when.format("%Y%m%d")
    ));
    content.push_str(&format!(
        "(0008,0031) := \"{}\" // Series Time\n",
        when.format("%H%M%S")
    ));
    fs::write(destination, content)
        .with_context(|| format!("Failed to write anonymisation script {}", destination.display()))?;
    Ok(destination.to_path_buf())
}

/// Stamp `script` with the current local time into `dir/customised_script.das`.
pub fn stamp_series_now(script: &Path, dir: &Path) -> Result<PathBuf> {
    stamp_series_datetime(script, &dir.join("customised_script.das"), Local::now().naive_local())
}
