//
// discovery.rs
// Rtss-Tools-rs
//
// Locates candidate DICOM files on disk and exposes them, with their ROI labels, through the RoiSource seam.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::models::StructureSet;
use crate::rtstruct;

/// Where the batch driver gets files and ROI labels from.
pub trait RoiSource {
    fn find_candidate_files(&self, case_id: &str) -> Result<Vec<PathBuf>>;
    fn find_all_files(&self) -> Result<Vec<PathBuf>>;
    fn read_labels(&self, file: &Path) -> Result<StructureSet>;
}

/// RoiSource backed by a directory tree of `.dcm` files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl RoiSource for DirectorySource {
    fn find_candidate_files(&self, case_id: &str) -> Result<Vec<PathBuf>> {
        Ok(find_case_files(&self.root, case_id))
    }

    fn find_all_files(&self) -> Result<Vec<PathBuf>> {
        Ok(find_all_files(&self.root))
    }

    fn read_labels(&self, file: &Path) -> Result<StructureSet> {
        rtstruct::read_structure_set(file)
    }
}

/// Every `.dcm` file under `root` whose file name contains `case_id`, sorted by path.
pub fn find_case_files(root: &Path, case_id: &str) -> Vec<PathBuf> {
    dicom_files(root)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.contains(case_id))
        })
        .collect()
}

/// Every `.dcm` file under `root`, sorted by path.
pub fn find_all_files(root: &Path) -> Vec<PathBuf> {
    dicom_files(root)
}

fn dicom_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "dcm"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
