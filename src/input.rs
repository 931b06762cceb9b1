//
// input.rs
// Rtss-Tools-rs
//
// Parses the batch table: one case per row, case id first, then the ROI labels to keep.
//
// Thales Matheus Mendonça Santos - November 2025

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::InputError;
use crate::models::CaseRequest;

pub fn read_batch_table(path: &Path) -> Result<Vec<CaseRequest>, InputError> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_rows(reader, path)
}

fn parse_rows<R: Read>(mut reader: csv::Reader<R>, path: &Path) -> Result<Vec<CaseRequest>, InputError> {
    let mut cases = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // Only leading blanks are insignificant; ROI names may end in spaces.
        let fields: Vec<&str> = record.iter().map(str::trim_start).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        let case_id = fields[0].trim_end();
        if case_id.is_empty() {
            return Err(InputError::EmptyCaseId {
                path: path.to_path_buf(),
                row: idx + 1,
            });
        }

        cases.push(CaseRequest {
            case_id: case_id.to_string(),
            labels: fields[1..]
                .iter()
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string())
                .collect(),
        });
    }
    Ok(cases)
}
