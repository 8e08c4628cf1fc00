use crate::chardiff::{CharChange, CharDiffOptions, char_diff_with};
use crate::correlate::{CorrelateOptions, correlate_with};
use crate::diff::{Hunk, Line};

/// A hunk line together with its intra-line change ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedLine {
    pub line: Line,
    pub changes: Vec<CharChange>,
}

/// Tuning for [`highlight_hunk_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HighlightOptions {
    pub correlate: CorrelateOptions,
    pub char_diff: CharDiffOptions,
}

/// Highlight every line of a hunk with the default options.
///
/// The result has one entry per line in `hunk.lines`. Correlated removed /
/// added pairs carry their character diff; every other line has no changes.
#[must_use]
pub fn highlight_hunk(hunk: &Hunk) -> Vec<HighlightedLine> {
    highlight_hunk_with(hunk, &HighlightOptions::default())
}

/// [`highlight_hunk`] with explicit options
#[must_use]
pub fn highlight_hunk_with(hunk: &Hunk, options: &HighlightOptions) -> Vec<HighlightedLine> {
    let mut result: Vec<HighlightedLine> = hunk
        .lines
        .iter()
        .map(|line| HighlightedLine {
            line: line.clone(),
            changes: Vec::new(),
        })
        .collect();

    for (old, new) in correlate_with(&hunk.lines, &options.correlate) {
        let (old_changes, new_changes) = char_diff_with(
            &hunk.lines[old].content,
            &hunk.lines[new].content,
            &options.char_diff,
        );
        result[old].changes = old_changes;
        result[new].changes = new_changes;
    }

    result
}
