//
// similarity.rs
// Rtss-Tools-rs
//
// Ratcliff/Obershelp string similarity and a ranked close-match search used to reconcile ROI labels.
//
// Thales Matheus Mendonça Santos - November 2025

/// Similarity in `[0, 1]`: twice the number of matched characters over the combined length.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_characters(&a, &b, 0, a.len(), 0, b.len());
    2.0 * matched as f64 / total as f64
}

/// Up to `n` entries of `possibilities` whose similarity to `word` reaches `cutoff`, best first.
///
/// Equal scores rank the lexically greater candidate first, and repeated possibilities are
/// only considered once. With `ignore_case` the scores are computed on lower-cased text, but
/// the returned strings are the originals.
pub fn close_matches<S: AsRef<str>>(
    word: &str,
    possibilities: &[S],
    n: usize,
    cutoff: f64,
    ignore_case: bool,
) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }

    let fold = |s: &str| {
        if ignore_case {
            s.to_lowercase()
        } else {
            s.to_string()
        }
    };
    let target = fold(word);

    let mut scored: Vec<(f64, &str)> = Vec::new();
    for candidate in possibilities.iter().map(AsRef::as_ref) {
        if scored.iter().any(|(_, seen)| *seen == candidate) {
            continue;
        }
        let score = ratio(&fold(candidate), &target);
        if score >= cutoff {
            scored.push((score, candidate));
        }
    }

    scored.sort_by(|x, y| y.0.total_cmp(&x.0).then_with(|| y.1.cmp(x.1)));
    scored
        .into_iter()
        .take(n)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

fn matching_characters(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> usize {
    let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
    if size == 0 {
        return 0;
    }
    let mut total = size;
    if alo < i && blo < j {
        total += matching_characters(a, b, alo, i, blo, j);
    }
    if i + size < ahi && j + size < bhi {
        total += matching_characters(a, b, i + size, ahi, j + size, bhi);
    }
    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`, earliest in `a` then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j + 1] holds the length of the common run ending at a[i - 1], b[j].
    let mut run = vec![0usize; b.len() + 1];
    for i in alo..ahi {
        let mut next = vec![0usize; b.len() + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = run[j] + 1;
                next[j + 1] = k;
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        run = next;
    }
    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_disjoint_strings() {
        assert_eq!(ratio("GTV1", "GTV1"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn ratio_counts_matching_blocks() {
        // "CTV" + "50" matched out of 6 + 5 characters.
        let score = ratio("CTV50", "CTV_50");
        assert!((score - 10.0 / 11.0).abs() < 1e-9);

        // Nine shared characters out of 9 + 14.
        let score = ratio("Brainstem_Stem", "Brainstem");
        assert!((score - 18.0 / 23.0).abs() < 1e-9);
    }

    #[test]
    fn blocks_are_found_on_both_sides_of_the_longest_match() {
        // "abcd" in the middle, then "x" on the left and "z" on the right.
        assert!((ratio("xabcdz", "x_abcd_z") - 12.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn close_matches_respects_cutoff_and_limit() {
        // "Node10" scores 8/11 against "Node5" and falls below the cutoff.
        let present = ["Node7", "Node9", "Node3", "Node10", "Heart"];
        let found = close_matches("Node5", &present, 3, 0.75, false);
        assert_eq!(found, vec!["Node9", "Node7", "Node3"]);

        let found = close_matches("Node5", &present, 2, 0.75, false);
        assert_eq!(found, vec!["Node9", "Node7"]);

        assert!(close_matches("Node5", &present, 0, 0.75, false).is_empty());
        assert!(close_matches("Xyz123", &["CompletelyUnrelatedLabel"], 3, 0.75, false).is_empty());
    }

    #[test]
    fn close_matches_ranks_best_first() {
        let present = ["PTV_high", "PTV_hi", "PTV"];
        let found = close_matches("PTV_hig", &present, 3, 0.6, false);
        assert_eq!(found[0], "PTV_high");
    }

    #[test]
    fn ignore_case_scores_folded_text_but_returns_originals() {
        let present = ["BRAINSTEM", "brainstem", "Cord"];
        let found = close_matches("Brainstem", &present, 3, 0.75, true);
        assert_eq!(found, vec!["brainstem", "BRAINSTEM"]);

        assert!(close_matches("Brainstem", &["BRAINSTEM"], 3, 0.75, false).is_empty());
    }

    #[test]
    fn equal_scores_rank_greater_candidate_first() {
        let found = close_matches("Node5", &["Node7", "Node9"], 3, 0.75, false);
        assert_eq!(found, vec!["Node9", "Node7"]);

        let found = close_matches("Node5", &["Node9", "Node7"], 3, 0.75, false);
        assert_eq!(found, vec!["Node9", "Node7"]);
    }

    #[test]
    fn repeated_possibilities_are_considered_once() {
        let found = close_matches("CTV_50", &["CTV50", "CTV50"], 3, 0.75, false);
        assert_eq!(found, vec!["CTV50"]);
    }
}
