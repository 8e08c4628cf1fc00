//! Pairing of removed and added lines within a hunk.
//!
//! A run of removed lines immediately followed by a run of added lines is
//! treated as a candidate replacement block. Lines inside such a block are
//! paired by edit-distance similarity so that each pair can be fed to the
//! character diff engine.

use crate::diff::{Line, LineType};

/// Minimum average position-wise similarity for equal-length runs to be
/// paired index by index.
pub const POSITIONAL_THRESHOLD: f64 = 0.5;

/// Minimum similarity for a removed/added pair in greedy matching.
pub const MATCH_THRESHOLD: f64 = 0.4;

/// Tuning knobs for [`correlate_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelateOptions {
    /// Equal-length runs whose average similarity exceeds this are paired
    /// position-wise without further matching
    pub positional_threshold: f64,
    /// A greedy pair is only accepted when its similarity exceeds this
    pub match_threshold: f64,
}

impl Default for CorrelateOptions {
    fn default() -> Self {
        Self {
            positional_threshold: POSITIONAL_THRESHOLD,
            match_threshold: MATCH_THRESHOLD,
        }
    }
}

/// Pair removed lines with the added lines that replace them, using the
/// default thresholds.
///
/// Returns `(removed_index, added_index)` pairs of absolute indices into
/// `lines`, sorted by removed index.
///
/// ```
/// use git_hunks::correlate::correlate;
/// use git_hunks::diff::Line;
///
/// let lines = [
///     Line::removed("let x = compute(a, b);", 4),
///     Line::added("let x = compute(a, c);", 4),
/// ];
/// assert_eq!(correlate(&lines), vec![(0, 1)]);
/// ```
#[must_use]
pub fn correlate(lines: &[Line]) -> Vec<(usize, usize)> {
    correlate_with(lines, &CorrelateOptions::default())
}

/// [`correlate`] with explicit thresholds
#[must_use]
pub fn correlate_with(lines: &[Line], options: &CorrelateOptions) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].kind != LineType::Removed {
            i += 1;
            continue;
        }

        let removed_start = i;
        while i < lines.len() && lines[i].kind == LineType::Removed {
            i += 1;
        }
        let added_start = i;
        while i < lines.len() && lines[i].kind == LineType::Added {
            i += 1;
        }

        let removed: Vec<&str> = lines[removed_start..added_start]
            .iter()
            .map(|l| l.content.as_str())
            .collect();
        let added: Vec<&str> = lines[added_start..i]
            .iter()
            .map(|l| l.content.as_str())
            .collect();

        pairs.extend(
            pair_runs(&removed, &added, options)
                .into_iter()
                .map(|(r, a)| (removed_start + r, added_start + a)),
        );
    }

    pairs
}

/// Pair two runs, returning run-relative indices
fn pair_runs(removed: &[&str], added: &[&str], options: &CorrelateOptions) -> Vec<(usize, usize)> {
    if removed.is_empty() || added.is_empty() {
        return Vec::new();
    }

    if removed.len() == added.len() {
        let total: f64 = removed
            .iter()
            .zip(added)
            .map(|(r, a)| similarity(r, a))
            .sum();
        if total / removed.len() as f64 > options.positional_threshold {
            return (0..removed.len()).map(|k| (k, k)).collect();
        }
    }

    let mut used = vec![false; added.len()];
    let mut pairs = Vec::new();

    for (r, old) in removed.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;

        for (a, new) in added.iter().enumerate() {
            if used[a] {
                continue;
            }
            let score = similarity(old, new);
            if score > options.match_threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((a, score));
            }
        }

        if let Some((a, _)) = best {
            used[a] = true;
            pairs.push((r, a));
        }
    }

    pairs
}

/// Similarity in `[0, 1]`: `1 - levenshtein(a, b) / max(len(a), len(b))`,
/// measured in codepoints. Two empty strings are identical.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let longest = len_a.max(len_b);
    if longest == 0 {
        return 1.0;
    }

    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Levenshtein distance over codepoints
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn removed(content: &str) -> Line {
        Line::removed(content, 1)
    }

    fn added(content: &str) -> Line {
        Line::added(content, 1)
    }

    fn context(content: &str) -> Line {
        Line::context(content, 1, 1)
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("日本語", "日本人"), 1);
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("", "abcd"), 0.0);
        assert_eq!(similarity("abcd", "abce"), 0.75);
    }

    #[test]
    fn similar_equal_runs_pair_positionally() {
        let lines = [
            removed("let result = compute(alpha, beta);"),
            removed("println!(\"{}\", result);"),
            added("let result = compute(alpha, gamma);"),
            added("println!(\"{:?}\", result);"),
        ];
        assert_eq!(correlate(&lines), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn indices_are_absolute() {
        let lines = [
            Line::header("@@ -1,3 +1,3 @@"),
            context("fn main() {"),
            removed("    return 1"),
            added("    return 2"),
            context("}"),
        ];
        assert_eq!(correlate(&lines), vec![(2, 3)]);
    }

    #[test]
    fn greedy_matching_picks_best_candidate() {
        let lines = [
            removed("return handleError(err)"),
            removed("return fmt.Errorf(msg)"),
            removed("return nil"),
            added("return handleError(nil)"),
        ];
        assert_eq!(correlate(&lines), vec![(0, 3)]);
    }

    #[test]
    fn greedy_matching_never_reuses_added_line() {
        let lines = [
            removed("config.timeout = 30"),
            removed("config.timeout = 31"),
            added("config.timeout = 32"),
            added("something entirely different here"),
            added("zzzzzzzzzzzzzzzzzzz"),
        ];
        let pairs = correlate(&lines);
        assert_eq!(pairs, vec![(0, 2)]);
    }

    #[test]
    fn more_adds_than_removes() {
        let lines = [
            removed("func processData(input string) error {"),
            added("func processData(input string) (string, error) {"),
            added("    result := transform(input)"),
            added("    return result, nil"),
        ];
        assert_eq!(correlate(&lines), vec![(0, 1)]);
    }

    #[test]
    fn dissimilar_lines_stay_unpaired() {
        let lines = [removed("abc"), removed("def"), added("xyz"), added("uvw")];
        assert!(correlate(&lines).is_empty());
    }

    #[test]
    fn context_breaks_runs() {
        let lines = [
            removed("value = 1"),
            context("unchanged"),
            added("value = 2"),
        ];
        assert!(correlate(&lines).is_empty());
    }

    #[test]
    fn added_before_removed_is_not_paired() {
        let lines = [added("value = 2"), removed("value = 1")];
        assert!(correlate(&lines).is_empty());
    }

    #[test]
    fn empty_and_remove_only_input() {
        assert!(correlate(&[]).is_empty());
        assert!(correlate(&[removed("old1"), context("ctx")]).is_empty());
    }

    #[test]
    fn thresholds_are_configurable() {
        let lines = [removed("abcd"), added("axyz")];
        assert!(correlate(&lines).is_empty());

        let loose = CorrelateOptions {
            positional_threshold: 0.2,
            match_threshold: 0.2,
        };
        assert_eq!(correlate_with(&lines, &loose), vec![(0, 1)]);
    }

    #[test]
    fn multiple_blocks_in_one_hunk() {
        let lines = [
            removed("func foo() {"),
            added("func bar() {"),
            context("    // body"),
            removed("    return 1"),
            added("    return 2"),
        ];
        assert_eq!(correlate(&lines), vec![(0, 1), (3, 4)]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Short lines over a small alphabet, so runs often pair up
    fn arb_lines() -> impl Strategy<Value = Vec<Line>> {
        let kind = prop::sample::select(vec![LineType::Context, LineType::Added, LineType::Removed]);
        prop::collection::vec((kind, "[ab =;x]{0,8}"), 0..16).prop_map(|body| {
            body.into_iter()
                .map(|(kind, content)| match kind {
                    LineType::Added => Line::added(content, 1),
                    LineType::Removed => Line::removed(content, 1),
                    _ => Line::context(content, 1, 1),
                })
                .collect()
        })
    }

    proptest! {
        /// Pairs join a removed line to a later added line of the same run
        #[test]
        fn pairs_stay_within_one_run(lines in arb_lines()) {
            for (r, a) in correlate(&lines) {
                prop_assert!(r < a && a < lines.len(), "pair ({}, {})", r, a);
                prop_assert_eq!(lines[r].kind, LineType::Removed);
                prop_assert_eq!(lines[a].kind, LineType::Added);
                prop_assert!(
                    lines[r..a].iter().all(|l| l.kind != LineType::Context),
                    "pair ({}, {}) crosses context", r, a
                );
            }
        }

        /// No line takes part in more than one pair
        #[test]
        fn pairs_are_unique_on_both_sides(lines in arb_lines()) {
            let pairs = correlate(&lines);
            let mut removed: Vec<usize> = pairs.iter().map(|(r, _)| *r).collect();
            let mut added: Vec<usize> = pairs.iter().map(|(_, a)| *a).collect();
            removed.dedup();
            added.sort_unstable();
            added.dedup();
            prop_assert_eq!(removed.len(), pairs.len());
            prop_assert_eq!(added.len(), pairs.len());
            prop_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }
}
