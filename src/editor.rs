//
// editor.rs
// Rtss-Tools-rs
//
// Wraps the rtsedit command-line tool that rewrites an RTSTRUCT keeping only the included ROIs,
// and classifies its free-text output.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::ToolError;
use crate::tool::{self, ToolOutput};

/// Applies a label list to a structure set file, writing the result to `output`.
#[async_trait]
pub trait Editor: Send + Sync {
    async fn apply_labels(
        &self,
        file: &Path,
        labels: &[String],
        output: &Path,
    ) -> Result<ToolOutput, ToolError>;
}

/// The `rtsedit` binary from the etherj CLI tools.
#[derive(Debug, Clone)]
pub struct RtsEdit {
    pub program: PathBuf,
    /// Name given to the edited structure set.
    pub structure_label: String,
    pub timeout: Duration,
}

impl RtsEdit {
    pub fn arguments(&self, file: &Path, labels: &[String], output: &Path) -> Vec<String> {
        let mut args = vec![
            "--label".to_string(),
            self.structure_label.clone(),
            "--include".to_string(),
        ];
        args.extend(labels.iter().cloned());
        args.push("--output".to_string());
        args.push(output.display().to_string());
        args.push(file.display().to_string());
        args
    }
}

#[async_trait]
impl Editor for RtsEdit {
    async fn apply_labels(
        &self,
        file: &Path,
        labels: &[String],
        output: &Path,
    ) -> Result<ToolOutput, ToolError> {
        let args = self.arguments(file, labels, output);
        tool::run_tool(self.program.as_os_str(), &args, self.timeout).await
    }
}

static EXCEPTION: LazyLock<Regex> = LazyLock::new(|| tool::word_pattern("exception"));
static NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| tool::word_pattern("not found"));
static NOTHING_REMOVED: LazyLock<Regex> =
    LazyLock::new(|| tool::word_pattern("No ROIs would be removed"));

/// What the editor output says about an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditReport {
    /// stderr mentions an exception.
    pub exception: bool,
    /// stdout says some included label was not found.
    pub labels_not_found: bool,
    /// stdout says the edit would not remove anything.
    pub nothing_removed: bool,
    /// The process exited non-zero or was killed.
    pub exit_failed: bool,
}

impl EditReport {
    pub fn is_clean(&self) -> bool {
        !self.exception && !self.labels_not_found && !self.exit_failed
    }
}

/// The only place rtsedit's text contract is interpreted.
pub fn classify_edit(output: &ToolOutput) -> EditReport {
    EditReport {
        exception: EXCEPTION.is_match(&output.stderr),
        labels_not_found: NOT_FOUND.is_match(&output.stdout),
        nothing_removed: NOTHING_REMOVED.is_match(&output.stdout),
        exit_failed: !output.succeeded(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            status: Some(0),
        }
    }

    #[test]
    fn arguments_keep_each_label_separate() {
        let editor = RtsEdit {
            program: PathBuf::from("rtsedit"),
            structure_label: "ALT_RTSS".to_string(),
            timeout: Duration::from_secs(1),
        };
        let labels = vec!["GTV 1".to_string(), "CTV50".to_string()];
        let args = editor.arguments(Path::new("in.dcm"), &labels, Path::new("out.dcm"));
        assert_eq!(
            args,
            vec!["--label", "ALT_RTSS", "--include", "GTV 1", "CTV50", "--output", "out.dcm", "in.dcm"]
        );
    }

    #[test]
    fn classification_follows_output_tokens() {
        assert!(classify_edit(&output("Wrote out.dcm", "")).is_clean());

        let report = classify_edit(&output("ROI GTV2 not found", ""));
        assert!(report.labels_not_found);
        assert!(!report.is_clean());

        let report = classify_edit(&output("", "Exception in thread \"main\""));
        assert!(report.exception);
        assert!(!report.is_clean());

        // Tokens only count on the stream they are expected on.
        assert!(classify_edit(&output("exception", "not found")).is_clean());

        let report = classify_edit(&output("No ROIs would be removed", ""));
        assert!(report.nothing_removed);
        assert!(report.is_clean());
    }

    #[test]
    fn non_zero_exit_is_never_clean() {
        let usage = ToolOutput {
            stdout: String::new(),
            stderr: "Usage: rtsedit [options] Unknown option --bogus".to_string(),
            status: Some(2),
        };
        let report = classify_edit(&usage);
        assert!(report.exit_failed);
        assert!(!report.exception);
        assert!(!report.is_clean());

        let killed = ToolOutput {
            status: None,
            ..output("Wrote out.dcm", "")
        };
        assert!(!classify_edit(&killed).is_clean());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_the_configured_program() {
        let editor = RtsEdit {
            program: PathBuf::from("echo"),
            structure_label: "ALT_RTSS".to_string(),
            timeout: Duration::from_secs(10),
        };
        let labels = vec!["GTV1".to_string()];
        let out = editor
            .apply_labels(Path::new("in.dcm"), &labels, Path::new("out.dcm"))
            .await
            .expect("echo runs");
        assert_eq!(out.stdout.trim(), "--label ALT_RTSS --include GTV1 --output out.dcm in.dcm");
        assert!(classify_edit(&out).is_clean());
    }
}
