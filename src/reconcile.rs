//
// reconcile.rs
// Rtss-Tools-rs
//
// Reconciles the ROI labels requested for a case with the labels actually present in a structure set,
// recording every substitution decision for the batch audit trail.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::similarity;

/// Matching knobs; the defaults reproduce the behaviour of the batch editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Minimum similarity a fuzzy candidate must reach.
    pub cutoff: f64,
    /// Maximum number of fuzzy candidates examined per missing label.
    pub max_candidates: usize,
    /// Whether the membership test deciding which labels are missing is case-sensitive.
    pub case_sensitive_exact_match: bool,
    /// Whether fuzzy candidates are scored on lower-cased labels.
    pub fuzzy_ignore_case: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            cutoff: 0.75,
            max_candidates: 3,
            case_sensitive_exact_match: true,
            fuzzy_ignore_case: true,
        }
    }
}

/// Outcome of one decision taken for a missing label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelChange {
    /// `candidate` replaces `missing`. `rank` is `(position, candidates)` when digit tokens were compared.
    Accepted {
        missing: String,
        candidate: String,
        rank: Option<(usize, usize)>,
    },
    /// `candidate` was ranked but its digits disagree with `missing`.
    Rejected {
        missing: String,
        candidate: String,
        rank: (usize, usize),
    },
    NoReplacement { missing: String },
}

impl fmt::Display for LabelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelChange::Accepted {
                missing,
                candidate,
                rank: Some((position, total)),
            } => write!(f, "'{missing}' ==> '{candidate}' ({position}/{total})"),
            LabelChange::Accepted {
                missing,
                candidate,
                rank: None,
            } => write!(f, "'{missing}' ==> '{candidate}'"),
            LabelChange::Rejected {
                missing,
                candidate,
                rank: (position, total),
            } => write!(f, "'{missing}' IS NOT '{candidate}' ({position}/{total})"),
            LabelChange::NoReplacement { missing } => {
                write!(f, "Couldn't find replacement for '{missing}'")
            }
        }
    }
}

/// One line of the batch change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub case_id: String,
    pub change: LabelChange,
}

impl ChangeRecord {
    pub fn new(case_id: &str, change: LabelChange) -> Self {
        Self {
            case_id: case_id.to_string(),
            change,
        }
    }

    /// Human-readable audit line.
    pub fn description(&self) -> String {
        self.change.to_string()
    }
}

/// Substitutions accepted for a set of missing labels plus the records explaining them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub substitutions: Vec<String>,
    pub changes: Vec<ChangeRecord>,
}

/// Requested labels without an exact match in `present`, in request order and without repeats.
pub fn find_missing<S: AsRef<str>, P: AsRef<str>>(
    requested: &[S],
    present: &[P],
    options: &ReconcileOptions,
) -> Vec<String> {
    let key = |s: &str| {
        if options.case_sensitive_exact_match {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let present: HashSet<String> = present.iter().map(|p| key(p.as_ref())).collect();

    let mut seen = HashSet::new();
    requested
        .iter()
        .map(AsRef::as_ref)
        .filter(|label| !present.contains(&key(*label)))
        .filter(|label| seen.insert(label.to_string()))
        .map(str::to_string)
        .collect()
}

/// The numeric characters of `label`, in order.
pub fn digit_token(label: &str) -> String {
    label.chars().filter(char::is_ascii_digit).collect()
}

/// Look for a replacement for each missing label among the present ones.
///
/// Labels without digits take the best fuzzy candidate. Labels with digits only accept a
/// candidate carrying the same digit token, walking the ranking best first; every rejected
/// candidate is logged, and a label left without a replacement always ends with a
/// `NoReplacement` record.
pub fn reconcile<S: AsRef<str>, P: AsRef<str>>(
    missing: &[S],
    present: &[P],
    case_id: &str,
    options: &ReconcileOptions,
) -> Reconciliation {
    let mut result = Reconciliation::default();

    for missing in missing.iter().map(AsRef::as_ref) {
        let candidates = similarity::close_matches(
            missing,
            present,
            options.max_candidates,
            options.cutoff,
            options.fuzzy_ignore_case,
        );

        match choose_candidate(missing, &candidates, case_id, &mut result.changes) {
            Some(candidate) => result.substitutions.push(candidate),
            None => result.changes.push(ChangeRecord::new(
                case_id,
                LabelChange::NoReplacement {
                    missing: missing.to_string(),
                },
            )),
        }
    }

    result
}

fn choose_candidate(
    missing: &str,
    candidates: &[String],
    case_id: &str,
    changes: &mut Vec<ChangeRecord>,
) -> Option<String> {
    let best = candidates.first()?;
    let wanted = digit_token(missing);

    if wanted.is_empty() {
        changes.push(ChangeRecord::new(
            case_id,
            LabelChange::Accepted {
                missing: missing.to_string(),
                candidate: best.clone(),
                rank: None,
            },
        ));
        return Some(best.clone());
    }

    let total = candidates.len();
    for (idx, candidate) in candidates.iter().enumerate() {
        let rank = (idx + 1, total);
        if digit_token(candidate) == wanted {
            changes.push(ChangeRecord::new(
                case_id,
                LabelChange::Accepted {
                    missing: missing.to_string(),
                    candidate: candidate.clone(),
                    rank: Some(rank),
                },
            ));
            return Some(candidate.clone());
        }
        changes.push(ChangeRecord::new(
            case_id,
            LabelChange::Rejected {
                missing: missing.to_string(),
                candidate: candidate.clone(),
                rank,
            },
        ));
    }

    None
}

/// Requested labels minus the missing ones, followed by the accepted substitutions.
pub fn build_reconciled_list<S: AsRef<str>>(
    requested: &[S],
    missing: &[String],
    substitutions: &[String],
) -> Vec<String> {
    requested
        .iter()
        .map(AsRef::as_ref)
        .filter(|label| !missing.iter().any(|m| m == label))
        .map(str::to_string)
        .chain(substitutions.iter().cloned())
        .collect()
}

/// Labels from `present` containing any of `needles` (case-insensitive), grouped by needle.
pub fn select_by_substring<P: AsRef<str>, N: AsRef<str>>(present: &[P], needles: &[N]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for needle in needles.iter().map(|n| n.as_ref().to_lowercase()) {
        for label in present.iter().map(AsRef::as_ref) {
            if label.to_lowercase().contains(&needle) && !selected.iter().any(|s| s == label) {
                selected.push(label.to_string());
            }
        }
    }
    selected
}
