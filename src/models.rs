//
// models.rs
// Rtss-Tools-rs
//
// Defines serializable data structures for structure sets, batch requests, and the batch run summary.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reconcile::ChangeRecord;

/// ROI information read from a single DICOM file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSet {
    pub patient_name: Option<String>,
    /// True when the Modality attribute names an RTSTRUCT.
    pub is_structure_set: bool,
    /// ROI names in StructureSetROISequence order.
    pub labels: Vec<String>,
    /// ROI names whose contour item carries no contour data.
    pub empty_labels: Vec<String>,
}

/// One row of the batch input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRequest {
    pub case_id: String,
    pub labels: Vec<String>,
}

/// Everything a batch run accumulates, folded case by case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Case id -> reason the case was not edited cleanly.
    pub failures: BTreeMap<String, String>,
    pub changes: Vec<ChangeRecord>,
    /// Case id -> ROIs dropped from the edit because they hold no contours.
    pub empty_rois: BTreeMap<String, Vec<String>>,
    /// Source files copied because the editor had nothing to remove.
    pub copied: usize,
    pub cases: usize,
}
