//
// cli.rs
// Rtss-Tools-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the corresponding modules.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::anonymize::{self, Anonymizer, DicomEdit};
use crate::batch::{self, BatchOptions, Tools};
use crate::discovery::DirectorySource;
use crate::editor::RtsEdit;
use crate::models::BatchSummary;
use crate::reconcile::{self, ReconcileOptions};
use crate::{input, report, rtstruct};

/// Command-line interface glue code: defines the available verbs and dispatches to modules.
#[derive(Parser)]
#[command(name = "rtss-tools")]
#[command(about = "Batch editing of ROI collections in RTSTRUCT files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Edit the structure sets of every case listed in a CSV batch table
    Edit {
        /// CSV rows of `case id, label, label, ...`
        #[arg(short, long)]
        input: PathBuf,
        /// Directory searched for `.dcm` files whose name contains the case id
        #[arg(short, long)]
        directory: PathBuf,
        #[command(flatten)]
        tools: ToolArgs,
        #[command(flatten)]
        matching: MatchArgs,
    },
    /// Edit every structure set under a directory, keeping labels that contain the given strings
    Search {
        #[arg(short, long)]
        directory: PathBuf,
        /// Case-insensitive substring to keep (repeatable)
        #[arg(short = 's', long = "string", required = true)]
        strings: Vec<String>,
        #[command(flatten)]
        tools: ToolArgs,
        #[command(flatten)]
        matching: MatchArgs,
    },
    /// List the ROI labels of a case's structure sets
    Labels {
        case_id: String,
        #[arg(short, long)]
        directory: PathBuf,
    },
    /// Dry-run label reconciliation on comma-separated label lists
    Reconcile {
        #[arg(long, value_delimiter = ',')]
        requested: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        present: Vec<String>,
        #[arg(long, default_value = "dry-run")]
        case_id: String,
        #[command(flatten)]
        matching: MatchArgs,
    },
}

/// Locations and limits of the wrapped tools, plus output handling.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Directory receiving edited files and reports
    #[arg(short, long, default_value = "modified")]
    pub output: PathBuf,
    #[arg(long, env = "RTSEDIT_PATH", default_value = "etherj-cli-tools/bin/rtsedit")]
    pub rtsedit: PathBuf,
    /// Name given to the edited structure set
    #[arg(long, default_value = "ALT_RTSS")]
    pub structure_label: String,
    /// Seconds allowed for each external tool run
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,
    /// Copy the source file when the editor would remove nothing
    #[arg(long)]
    pub copy_unchanged: bool,
    /// DicomEdit script applied to every output; anonymisation is skipped without it
    #[arg(long)]
    pub anon_script: Option<PathBuf>,
    #[arg(long, env = "DICOM_EDIT_JAR", default_value = "dicom-edit.jar")]
    pub dicom_edit_jar: PathBuf,
    #[arg(long, env = "JAVA_PATH", default_value = "java")]
    pub java: PathBuf,
    /// Append Series Date/Time of the run to the anonymisation script
    #[arg(long, requires = "anon_script")]
    pub stamp_series: bool,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct MatchArgs {
    /// Minimum similarity for a fuzzy replacement
    #[arg(long, default_value_t = 0.75)]
    pub cutoff: f64,
    #[arg(long, default_value_t = 3)]
    pub max_candidates: usize,
    /// Treat labels differing only in case as present
    #[arg(long)]
    pub case_insensitive_exact: bool,
    /// Score fuzzy candidates without folding case
    #[arg(long)]
    pub case_sensitive_fuzzy: bool,
}

impl MatchArgs {
    pub fn options(&self) -> Result<ReconcileOptions> {
        if !(0.0..=1.0).contains(&self.cutoff) {
            bail!("--cutoff must lie between 0 and 1");
        }
        Ok(ReconcileOptions {
            cutoff: self.cutoff,
            max_candidates: self.max_candidates,
            case_sensitive_exact_match: !self.case_insensitive_exact,
            fuzzy_ignore_case: !self.case_sensitive_fuzzy,
        })
    }
}

pub async fn run() -> Result<()> {
    // Parse the raw CLI arguments once and dispatch to a subcommand handler.
    let cli = Cli::parse();

    match cli.command {
        Commands::Edit {
            input,
            directory,
            tools,
            matching,
        } => {
            let cases = input::read_batch_table(&input)?;
            let options = batch_options(&tools, &matching)?;
            let source = DirectorySource::new(&directory);
            let (editor, anonymizer) = build_tools(&tools)?;
            let summary = batch::run_table(
                &source,
                Tools {
                    editor: &editor,
                    anonymizer: anonymizer.as_ref().map(|a| a as &dyn Anonymizer),
                },
                &cases,
                &options,
            )
            .await?;
            finish(&summary, &tools.output)?;
        }
        Commands::Search {
            directory,
            strings,
            tools,
            matching,
        } => {
            println!("Strings to search for: {:?}", strings);
            let options = batch_options(&tools, &matching)?;
            let source = DirectorySource::new(&directory);
            let (editor, anonymizer) = build_tools(&tools)?;
            let summary = batch::run_search(
                &source,
                Tools {
                    editor: &editor,
                    anonymizer: anonymizer.as_ref().map(|a| a as &dyn Anonymizer),
                },
                &strings,
                &options,
            )
            .await?;
            finish(&summary, &tools.output)?;
        }
        Commands::Labels { case_id, directory } => {
            rtstruct::print_case_labels(&directory, &case_id)?
        }
        Commands::Reconcile {
            requested,
            present,
            case_id,
            matching,
        } => print_reconciliation(&requested, &present, &case_id, &matching.options()?),
    }

    Ok(())
}

fn batch_options(tools: &ToolArgs, matching: &MatchArgs) -> Result<BatchOptions> {
    Ok(BatchOptions {
        output_dir: tools.output.clone(),
        copy_unchanged: tools.copy_unchanged,
        reconcile: matching.options()?,
    })
}

fn build_tools(args: &ToolArgs) -> Result<(RtsEdit, Option<DicomEdit>)> {
    let timeout = Duration::from_secs(args.timeout_secs);
    let editor = RtsEdit {
        program: args.rtsedit.clone(),
        structure_label: args.structure_label.clone(),
        timeout,
    };

    let anonymizer = match &args.anon_script {
        Some(script) => {
            let script = if args.stamp_series {
                std::fs::create_dir_all(&args.output)?;
                anonymize::stamp_series_now(script, &args.output)?
            } else {
                script.clone()
            };
            Some(DicomEdit {
                java: args.java.clone(),
                jar: args.dicom_edit_jar.clone(),
                script,
                timeout,
            })
        }
        None => None,
    };

    Ok((editor, anonymizer))
}

fn finish(summary: &BatchSummary, output: &Path) -> Result<()> {
    if !summary.failures.is_empty() {
        println!("Patients for which files were not edited correctly;");
        for case_id in summary.failures.keys() {
            println!("{case_id}");
        }
        println!(
            "Number of patients with files not edited correctly = {}/{}",
            summary.failures.len(),
            summary.cases
        );
    }

    report::save_summary(summary, &output.join("error_logs"), &report::file_stamp())?;

    if summary.copied != 0 {
        println!("Number of copied unedited files: {}", summary.copied);
    }
    println!("\nBatch rtsedit Complete!");
    Ok(())
}

fn print_reconciliation(requested: &[String], present: &[String], case_id: &str, options: &ReconcileOptions) {
    let missing = reconcile::find_missing(requested, present, options);
    let reconciliation = reconcile::reconcile(&missing, present, case_id, options);
    let reconciled = reconcile::build_reconciled_list(requested, &missing, &reconciliation.substitutions);

    println!("Missing:    {:?}", missing);
    println!("Reconciled: {:?}", reconciled);
    for change in &reconciliation.changes {
        println!("  {}: {}", change.case_id, change.description());
    }
}
