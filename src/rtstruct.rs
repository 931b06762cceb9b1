//
// rtstruct.rs
// Rtss-Tools-rs
//
// Reads ROI names and empty-contour ROIs out of RTSTRUCT files, and prints them for a case.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use dicom::core::Tag;
use dicom::object::{open_file, DefaultDicomObject};

use crate::dicom_access::ElementAccess;
use crate::discovery;
use crate::models::StructureSet;

const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
const MODALITY: Tag = Tag(0x0008, 0x0060);
const STRUCTURE_SET_ROI_SEQUENCE: Tag = Tag(0x3006, 0x0020);
const ROI_NUMBER: Tag = Tag(0x3006, 0x0022);
const ROI_NAME: Tag = Tag(0x3006, 0x0026);
const ROI_CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0039);
const CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0040);
const REFERENCED_ROI_NUMBER: Tag = Tag(0x3006, 0x0084);

pub fn extract_structure_set<T: ElementAccess>(obj: &T) -> StructureSet {
    let patient_name = obj.element_str(PATIENT_NAME);
    let is_structure_set = obj
        .element_str(MODALITY)
        .map_or(false, |m| m.contains("RTSTRUCT"));

    if !is_structure_set {
        return StructureSet {
            patient_name,
            ..StructureSet::default()
        };
    }

    let mut labels = Vec::new();
    let mut names_by_number = HashMap::new();
    for roi in obj.sequence_items(STRUCTURE_SET_ROI_SEQUENCE) {
        let Some(name) = roi.element_str(ROI_NAME) else {
            continue;
        };
        if let Some(number) = roi.element_str(ROI_NUMBER) {
            names_by_number.insert(number, name.clone());
        }
        labels.push(name);
    }

    // A contour item without ContourSequence is an ROI with nothing drawn.
    let empty_labels = obj
        .sequence_items(ROI_CONTOUR_SEQUENCE)
        .iter()
        .filter(|item| item.sequence_items(CONTOUR_SEQUENCE).is_empty())
        .filter_map(|item| item.element_str(REFERENCED_ROI_NUMBER))
        .filter_map(|number| names_by_number.get(&number).cloned())
        .collect();

    StructureSet {
        patient_name,
        is_structure_set,
        labels,
        empty_labels,
    }
}

pub fn read_structure_set(path: &Path) -> Result<StructureSet> {
    let obj: DefaultDicomObject = open_file(path)
        .with_context(|| format!("Failed to open DICOM file {}", path.display()))?;
    Ok(extract_structure_set(&obj))
}

/// Print the ROI names of every structure set belonging to `case_id` under `root`.
pub fn print_case_labels(root: &Path, case_id: &str) -> Result<()> {
    let files = discovery::find_case_files(root, case_id);
    if files.is_empty() {
        println!("No DICOM files matching {case_id} under {}", root.display());
        return Ok(());
    }

    for path in files {
        let structure = read_structure_set(&path)?;
        if !structure.is_structure_set {
            continue;
        }
        println!("{}", "=".repeat(80));
        println!("{}", path.display());
        println!("{}", "=".repeat(80));
        for label in &structure.labels {
            let marker = if structure.empty_labels.contains(label) {
                " (empty)"
            } else {
                ""
            };
            println!("  {label}{marker}");
        }
    }

    Ok(())
}
