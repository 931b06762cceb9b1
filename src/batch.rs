//
// batch.rs
// Rtss-Tools-rs
//
// Sequential batch driver: for each case it finds the structure set files, reconciles the requested
// ROI labels, runs the editor and anonymiser, and folds the outcome into the batch summary.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::anonymize::Anonymizer;
use crate::discovery::RoiSource;
use crate::editor::{self, Editor};
use crate::models::{BatchSummary, CaseRequest, StructureSet};
use crate::reconcile::{self, ChangeRecord, LabelChange, ReconcileOptions};
use crate::report;

/// Directory (under the output directory) receiving edits that missed some labels.
pub const BAD_EDIT_DIR: &str = "bad_edit";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    /// Copy the source file to the output when the editor has nothing to remove.
    pub copy_unchanged: bool,
    pub reconcile: ReconcileOptions,
}

/// External tools used by a batch run.
#[derive(Clone, Copy)]
pub struct Tools<'a> {
    pub editor: &'a dyn Editor,
    pub anonymizer: Option<&'a dyn Anonymizer>,
}

/// How the labels to keep are chosen for a case.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    /// Exactly these labels, reconciled against each file.
    Labels(&'a [String]),
    /// Every label of the file containing one of these strings.
    Substrings(&'a [String]),
}

/// What one case contributes to the batch summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseOutcome {
    /// Why no file of the case was edited cleanly.
    pub failure: Option<String>,
    pub changes: Vec<ChangeRecord>,
    pub empty_rois: Option<Vec<String>>,
    pub copied: usize,
}

impl BatchSummary {
    /// Fold one case into the summary.
    pub fn record(&mut self, case_id: &str, outcome: CaseOutcome) {
        self.cases += 1;
        self.copied += outcome.copied;
        self.changes.extend(outcome.changes);
        if let Some(empty) = outcome.empty_rois {
            self.empty_rois.insert(case_id.to_string(), empty);
        }
        if let Some(reason) = outcome.failure {
            self.failures.insert(case_id.to_string(), reason);
        }
    }
}

/// Table mode: one case per input row, candidate files found by case id.
pub async fn run_table(
    source: &dyn RoiSource,
    tools: Tools<'_>,
    cases: &[CaseRequest],
    options: &BatchOptions,
) -> Result<BatchSummary> {
    prepare_output(&options.output_dir)?;

    let mut summary = BatchSummary::default();
    for (idx, case) in cases.iter().enumerate() {
        println!(
            "\nEditing RTSTRUCT for patient {} ({}/{})",
            case.case_id,
            idx + 1,
            cases.len()
        );
        let outcome = match source.find_candidate_files(&case.case_id) {
            Ok(files) => {
                process_case(
                    source,
                    tools,
                    &case.case_id,
                    &files,
                    Selection::Labels(&case.labels),
                    options,
                )
                .await
            }
            Err(e) => CaseOutcome {
                failure: Some(format!("file discovery failed: {e:#}")),
                ..CaseOutcome::default()
            },
        };
        summary.record(&case.case_id, outcome);
    }

    Ok(summary)
}

/// Search mode: every DICOM file is a case named after its patient, keeping labels matching `needles`.
pub async fn run_search(
    source: &dyn RoiSource,
    tools: Tools<'_>,
    needles: &[String],
    options: &BatchOptions,
) -> Result<BatchSummary> {
    prepare_output(&options.output_dir)?;

    let files = source
        .find_all_files()
        .context("Failed to list DICOM files")?;
    let mut summary = BatchSummary::default();
    for (idx, file) in files.iter().enumerate() {
        // Read once: the patient name names the case and the labels drive the edit.
        let structure = source.read_labels(file);
        let case_id = structure
            .as_ref()
            .ok()
            .and_then(|s| s.patient_name.clone())
            .unwrap_or_else(|| file_stem(file));
        println!(
            "\nEditing RTSTRUCT for subject {} ({}/{})",
            case_id,
            idx + 1,
            files.len()
        );
        let outcome = edit_case(
            tools,
            &case_id,
            [(file.as_path(), structure)],
            Selection::Substrings(needles),
            options,
        )
        .await;
        summary.record(&case_id, outcome);
    }

    Ok(summary)
}

/// Edit the files of one case in order until one edit comes back clean.
pub async fn process_case(
    source: &dyn RoiSource,
    tools: Tools<'_>,
    case_id: &str,
    files: &[PathBuf],
    selection: Selection<'_>,
    options: &BatchOptions,
) -> CaseOutcome {
    let loaded = files
        .iter()
        .map(|file| (file.as_path(), source.read_labels(file)));
    edit_case(tools, case_id, loaded, selection, options).await
}

async fn edit_case<'f, I>(
    tools: Tools<'_>,
    case_id: &str,
    files: I,
    selection: Selection<'_>,
    options: &BatchOptions,
) -> CaseOutcome
where
    I: IntoIterator<Item = (&'f Path, Result<StructureSet>)>,
{
    let mut outcome = CaseOutcome::default();
    let mut last_reason: Option<String> = None;
    let mut saw_file = false;
    let mut saw_structure_set = false;

    for (file, structure) in files {
        saw_file = true;
        let structure = match structure {
            Ok(structure) => structure,
            Err(e) => {
                tracing::warn!(case_id, file = %file.display(), "Unreadable file: {e:#}");
                last_reason = Some(format!("cannot read {}: {e:#}", file.display()));
                continue;
            }
        };
        if !structure.is_structure_set {
            tracing::debug!(case_id, file = %file.display(), "Skipping non-RTSTRUCT file");
            continue;
        }
        saw_structure_set = true;

        let mut include = match selection {
            Selection::Labels(labels) => labels.to_vec(),
            Selection::Substrings(needles) => reconcile::select_by_substring(&structure.labels, needles),
        };

        let missing = reconcile::find_missing(&include, &structure.labels, &options.reconcile);
        let mut unresolved: Vec<String> = Vec::new();
        if !missing.is_empty() {
            tracing::info!(case_id, ?missing, "Requested labels missing from structure set");
            let reconciliation =
                reconcile::reconcile(&missing, &structure.labels, case_id, &options.reconcile);
            include = reconcile::build_reconciled_list(&include, &missing, &reconciliation.substitutions);
            unresolved = unresolved_labels(&missing, &reconciliation.changes);
            outcome.changes.extend(reconciliation.changes);
        }

        if !structure.empty_labels.is_empty() {
            include.retain(|label| !structure.empty_labels.contains(label));
            outcome.empty_rois = Some(structure.empty_labels.clone());
        }

        // An empty include list would strip every ROI.
        if include.is_empty() {
            let reason = if unresolved.is_empty() {
                "no labels left to keep".to_string()
            } else {
                format!("no requested labels could be resolved: {}", unresolved.join(", "))
            };
            tracing::warn!(case_id, file = %file.display(), "Skipping edit: {reason}");
            last_reason = Some(reason);
            continue;
        }

        let output_name = format!("ALT_{}_{}.dcm", file_safe(case_id), report::file_stamp());
        let output = options.output_dir.join(&output_name);

        let edit = match tools.editor.apply_labels(file, &include, &output).await {
            Ok(edit) => edit,
            Err(e) => {
                tracing::warn!(case_id, "Editor failed: {e}");
                last_reason = Some(e.to_string());
                continue;
            }
        };
        if !edit.stdout.trim().is_empty() {
            println!("{}", edit.stdout.trim_end());
        }
        let report = editor::classify_edit(&edit);

        if report.nothing_removed && options.copy_unchanged && !report.exit_failed {
            println!("Copying file...");
            match fs::copy(file, &output) {
                Ok(_) => outcome.copied += 1,
                Err(e) => tracing::warn!(case_id, "Failed to copy unchanged file: {e}"),
            }
        }

        if let Some(anonymizer) = tools.anonymizer {
            if output.exists() && !report.exit_failed {
                if let Err(e) = anonymizer.anonymize(&output).await {
                    tracing::warn!(case_id, "Anonymisation failed: {e}");
                    last_reason = Some(e.to_string());
                    move_to_bad_edit(&output, &options.output_dir, &output_name);
                    continue;
                }
            }
        }

        if report.is_clean() {
            if !unresolved.is_empty() {
                outcome.failure = Some(format!(
                    "edited without unresolved labels: {}",
                    unresolved.join(", ")
                ));
            }
            return outcome;
        }

        last_reason = Some(if report.labels_not_found {
            edit.stdout.trim().to_string()
        } else if !edit.stderr.trim().is_empty() {
            edit.stderr.trim().to_string()
        } else {
            format!("rtsedit {}", edit.exit_description())
        });
        if report.labels_not_found || report.exit_failed {
            tracing::warn!(case_id, status = ?edit.status, "Edit failed");
            move_to_bad_edit(&output, &options.output_dir, &output_name);
        }
    }

    outcome.failure = Some(match last_reason {
        Some(reason) => reason,
        None if !saw_file => {
            tracing::warn!(case_id, "No DICOM files found");
            "no DICOM files found for case".to_string()
        }
        None if !saw_structure_set => "no RTSTRUCT file found for case".to_string(),
        None => "edit did not complete cleanly".to_string(),
    });
    outcome
}

/// Missing labels that no change record accepted a substitution for.
fn unresolved_labels(missing: &[String], changes: &[ChangeRecord]) -> Vec<String> {
    missing
        .iter()
        .filter(|label| {
            !changes.iter().any(|record| {
                matches!(&record.change, LabelChange::Accepted { missing: accepted, .. } if accepted == *label)
            })
        })
        .cloned()
        .collect()
}

fn prepare_output(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir.join(BAD_EDIT_DIR))
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))
}

fn move_to_bad_edit(output: &Path, output_dir: &Path, name: &str) {
    if !output.exists() {
        return;
    }
    let target = output_dir.join(BAD_EDIT_DIR).join(name);
    if let Err(e) = fs::rename(output, &target) {
        tracing::warn!(file = %output.display(), "Failed to move bad edit: {e}");
    }
}

fn file_safe(case_id: &str) -> String {
    case_id.replace(['/', '\\'], "_")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_folds_case_outcomes() {
        let mut summary = BatchSummary::default();
        summary.record(
            "A1",
            CaseOutcome {
                empty_rois: Some(vec!["Heart".to_string()]),
                copied: 1,
                ..CaseOutcome::default()
            },
        );
        summary.record(
            "B2",
            CaseOutcome {
                failure: Some("ROI not found".to_string()),
                ..CaseOutcome::default()
            },
        );

        assert_eq!(summary.cases, 2);
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures["B2"], "ROI not found");
        assert_eq!(summary.empty_rois["A1"], vec!["Heart"]);
    }

    #[test]
    fn unresolved_labels_are_those_without_an_accepted_substitution() {
        let missing = vec!["CTV_50".to_string(), "Node5".to_string()];
        let changes = vec![
            ChangeRecord::new(
                "A1",
                LabelChange::Accepted {
                    missing: "CTV_50".to_string(),
                    candidate: "CTV50".to_string(),
                    rank: Some((1, 1)),
                },
            ),
            ChangeRecord::new(
                "A1",
                LabelChange::NoReplacement {
                    missing: "Node5".to_string(),
                },
            ),
        ];
        assert_eq!(unresolved_labels(&missing, &changes), vec!["Node5"]);
        assert!(unresolved_labels(&[], &changes).is_empty());
    }

    #[test]
    fn case_ids_are_made_file_safe() {
        assert_eq!(file_safe("RS/5293\\001"), "RS_5293_001");
        assert_eq!(file_stem(Path::new("/data/RS-1_rtss.dcm")), "RS-1_rtss");
    }
}
