//
// tool.rs
// Rtss-Tools-rs
//
// Runs the external command-line tools with a timeout and matches the words their output is judged by.
//
// Thales Matheus Mendonça Santos - November 2025

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use tokio::process::Command;

use crate::error::ToolError;

/// Captured output of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal.
    pub status: Option<i32>,
}

/// Run `program` with `args` to completion, killing it when `timeout` expires.
pub async fn run_tool<I, S>(program: &OsStr, args: I, timeout: Duration) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.to_string_lossy().into_owned();
    tracing::debug!(program = %name, ?timeout, "Running external tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: name.clone(),
            source,
        })?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn {
            program: name.clone(),
            source,
        })?,
        Err(_) => {
            tracing::warn!(program = %name, ?timeout, "External tool timed out");
            return Err(ToolError::Timeout {
                program: name,
                timeout,
            });
        }
    };

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status.code(),
    })
}

/// Case-insensitive whole-word pattern for `word` (which may contain spaces).
///
/// Callers keep the compiled pattern in a `LazyLock` so each token is built once.
pub fn word_pattern(word: &str) -> Regex {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word)))
        .case_insensitive(true)
        .build()
        .expect("escaped literal is a valid pattern")
}

impl ToolOutput {
    /// The process exited on its own with status 0.
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }

    /// Human-readable exit status for failure reports.
    pub fn exit_description(&self) -> String {
        match self.status {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by a signal".to_string(),
        }
    }
}
