//
// lib.rs
// Rtss-Tools-rs
//
// Exposes the crate's modules and re-exports the CLI entry point for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - November 2025

// Public surface of the library: label reconciliation, the batch driver, and its collaborators.
pub mod anonymize;
pub mod batch;
pub mod cli;
pub mod dicom_access;
pub mod discovery;
pub mod editor;
pub mod error;
pub mod input;
pub mod models;
pub mod reconcile;
pub mod report;
pub mod rtstruct;
pub mod similarity;
pub mod tool;

pub use cli::{run as run_cli, Cli, Commands};
