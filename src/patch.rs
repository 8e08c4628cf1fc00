//! Patch synthesis for staging, unstaging and reverting parts of a hunk.
//!
//! Every patch produced here is meant to be piped to
//! `git apply [--cached] --unidiff-zero -`. A selection that changes nothing
//! produces no patch (`None`, or an empty string from the `synthesize_*`
//! functions), which callers treat as a no-op.

use crate::diff::hunk::HunkHeader;
use crate::diff::{Hunk, Line, LineType};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

/// One body line of a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLine {
    /// Context, Added or Removed
    pub kind: LineType,
    pub content: String,
    /// Emit `\ No newline at end of file` after this line
    pub no_newline: bool,
}

impl PatchLine {
    fn from_line(line: &Line) -> Self {
        Self::as_kind(line, line.kind)
    }

    fn as_kind(line: &Line, kind: LineType) -> Self {
        PatchLine {
            kind,
            content: line.content.clone(),
            no_newline: line.no_newline,
        }
    }

    fn reversed(&self) -> Self {
        PatchLine {
            kind: self.kind.reversed(),
            content: self.content.clone(),
            no_newline: self.no_newline,
        }
    }
}

/// A hunk of a synthesized patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// Text after the closing `@@`, carried over from the source hunk
    pub section: String,
    /// Header of the source hunk, written verbatim while it still agrees
    /// with the numbers and section above
    pub header_text: Option<String>,
    pub lines: Vec<PatchLine>,
}

impl PatchHunk {
    /// Swap old and new sides, so applying the result undoes this hunk
    #[must_use]
    pub fn reversed(&self) -> Self {
        PatchHunk {
            old_start: self.new_start,
            old_count: self.new_count,
            new_start: self.old_start,
            new_count: self.old_count,
            section: self.section.clone(),
            header_text: self.header_text.clone(),
            lines: self.lines.iter().map(PatchLine::reversed).collect(),
        }
    }
}

impl fmt::Display for PatchHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = HunkHeader {
            old_start: self.old_start,
            old_count: self.old_count,
            new_start: self.new_start,
            new_count: self.new_count,
            section: &self.section,
        };
        match self.header_text.as_deref() {
            Some(text) if HunkHeader::parse(text) == Some(header) => writeln!(f, "{text}")?,
            _ => writeln!(f, "{header}")?,
        }

        for line in &self.lines {
            let prefix = line.kind.prefix().unwrap_or(' ');
            writeln!(f, "{prefix}{}", line.content)?;
            if line.no_newline {
                writeln!(f, "\\ No newline at end of file")?;
            }
        }

        Ok(())
    }
}

/// A single-file patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub path: String,
    pub hunks: Vec<PatchHunk>,
}

impl Patch {
    /// Patch containing a whole hunk, unchanged
    #[must_use]
    pub fn whole_hunk(path: &str, hunk: &Hunk) -> Self {
        Patch {
            path: path.to_string(),
            hunks: vec![PatchHunk {
                old_start: hunk.old_start,
                old_count: hunk.old_count,
                new_start: hunk.new_start,
                new_count: hunk.new_count,
                section: hunk.section().to_string(),
                header_text: Some(hunk.header_text.clone()),
                lines: hunk.body().map(PatchLine::from_line).collect(),
            }],
        }
    }

    /// Patch containing only the selected lines of a hunk.
    ///
    /// Unselected added lines are dropped and unselected removed lines become
    /// context, so the patch leaves them as they are in the target. Returns
    /// `None` when no added or removed line is selected.
    #[must_use]
    pub fn line_subset(path: &str, selection: &LineSelection<'_>) -> Option<Self> {
        let hunk = selection.hunk;
        let mut lines = Vec::new();

        for (i, line) in hunk.lines.iter().enumerate() {
            let selected = selection.indices.contains(&i);
            match line.kind {
                LineType::HunkHeader => {}
                LineType::Context => lines.push(PatchLine::from_line(line)),
                LineType::Added if selected => lines.push(PatchLine::from_line(line)),
                LineType::Added => {}
                LineType::Removed if selected => lines.push(PatchLine::from_line(line)),
                LineType::Removed => lines.push(PatchLine::as_kind(line, LineType::Context)),
            }
        }

        if !lines.iter().any(|line| line.kind.is_change()) {
            return None;
        }

        let old_count = count(&lines, LineType::in_old);
        let new_count = count(&lines, LineType::in_new);

        Some(Patch {
            path: path.to_string(),
            hunks: vec![PatchHunk {
                old_start: rebase_start(hunk.old_start, hunk.old_count, old_count),
                old_count,
                new_start: rebase_start(hunk.new_start, hunk.new_count, new_count),
                new_count,
                section: hunk.section().to_string(),
                header_text: Some(hunk.header_text.clone()),
                lines,
            }],
        })
    }

    /// Patch that takes the selected lines of a hunk back out of a target
    /// that already contains the whole hunk, e.g. unstaging from the index.
    ///
    /// This is the selection taken on the reversed hunk: unselected added
    /// lines stay as context and unselected removed lines are dropped, then
    /// every prefix and the header sides are swapped.
    #[must_use]
    pub fn line_subset_reversed(path: &str, selection: &LineSelection<'_>) -> Option<Self> {
        let reversed = selection.hunk.reversed();
        Self::line_subset(
            path,
            &LineSelection {
                hunk: &reversed,
                indices: selection.indices.clone(),
            },
        )
    }

    /// Patch staging a character range of one added or removed line.
    ///
    /// For an added line the new side is the line cut off at `char_end`, and
    /// the old side is the nearest removed line above it (without crossing
    /// context), if any. For a removed line the old side is the whole line
    /// and the new side is the nearest added line below it, if any.
    ///
    /// Returns `None` for out-of-range or non-change lines and for empty
    /// ranges.
    #[must_use]
    pub fn char_range(path: &str, selection: &CharSelection<'_>) -> Option<Self> {
        let hunk = selection.hunk;
        let target = hunk.lines.get(selection.line_index)?;
        if !target.kind.is_change() || selection.char_start >= selection.char_end {
            return None;
        }

        let end = selection.char_end.min(target.content.chars().count());
        if selection.char_start >= end {
            return None;
        }

        let (old_line, new_line) = match target.kind {
            LineType::Added => {
                let paired = hunk.lines[..selection.line_index]
                    .iter()
                    .rev()
                    .take_while(|l| l.kind != LineType::Context)
                    .find(|l| l.kind == LineType::Removed);
                let staged = PatchLine {
                    kind: LineType::Added,
                    content: target.content.chars().take(end).collect(),
                    no_newline: target.no_newline,
                };
                (paired, Some(staged))
            }
            _ => {
                let paired = hunk.lines[selection.line_index + 1..]
                    .iter()
                    .take_while(|l| l.kind != LineType::Context)
                    .find(|l| l.kind == LineType::Added);
                (Some(target), paired.map(PatchLine::from_line))
            }
        };

        let old_start = match old_line {
            Some(line) => line.old_line_number,
            None => insertion_point(hunk, selection.line_index),
        };
        let new_start = match (old_line.is_some(), new_line.is_some()) {
            (true, true) => old_start,
            (false, _) => old_start.saturating_add(1),
            (true, false) => old_start.saturating_sub(1),
        };

        let mut lines: Vec<PatchLine> = old_line.map(PatchLine::from_line).into_iter().collect();
        lines.extend(new_line);

        Some(Patch {
            path: path.to_string(),
            hunks: vec![PatchHunk {
                old_start,
                old_count: count(&lines, LineType::in_old),
                new_start,
                new_count: count(&lines, LineType::in_new),
                section: String::new(),
                header_text: None,
                lines,
            }],
        })
    }

    /// Swap old and new sides of every hunk
    #[must_use]
    pub fn reversed(&self) -> Self {
        Patch {
            path: self.path.clone(),
            hunks: self.hunks.iter().map(PatchHunk::reversed).collect(),
        }
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "diff --git a/{0} b/{0}", self.path)?;
        writeln!(f, "--- a/{}", self.path)?;
        writeln!(f, "+++ b/{}", self.path)?;
        for hunk in &self.hunks {
            write!(f, "{hunk}")?;
        }
        Ok(())
    }
}

/// Lines of a hunk chosen for staging, by index into `hunk.lines`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSelection<'a> {
    pub hunk: &'a Hunk,
    pub indices: BTreeSet<usize>,
}

impl<'a> LineSelection<'a> {
    pub fn new(hunk: &'a Hunk, indices: impl IntoIterator<Item = usize>) -> Self {
        LineSelection {
            hunk,
            indices: indices.into_iter().collect(),
        }
    }

    /// Lines covered by inclusive index ranges, ignoring indices past the
    /// end of the hunk
    #[must_use]
    pub fn from_ranges(hunk: &'a Hunk, ranges: &[RangeInclusive<usize>]) -> Self {
        let last = hunk.lines.len().saturating_sub(1);
        Self::new(
            hunk,
            ranges
                .iter()
                .flat_map(|range| *range.start()..=(*range.end()).min(last)),
        )
    }

    /// Every line of the hunk
    #[must_use]
    pub fn all(hunk: &'a Hunk) -> Self {
        Self::new(hunk, 0..hunk.lines.len())
    }
}

/// A rune range `[char_start, char_end)` within one line of a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSelection<'a> {
    pub hunk: &'a Hunk,
    pub line_index: usize,
    pub char_start: usize,
    pub char_end: usize,
}

/// Patch text for a whole hunk
#[must_use]
pub fn synthesize_whole_hunk(path: &str, hunk: &Hunk) -> String {
    Patch::whole_hunk(path, hunk).to_string()
}

/// Patch text for a line subset; `reverse` produces the unstage variant.
/// Empty when the selection changes nothing.
#[must_use]
pub fn synthesize_line_subset(path: &str, selection: &LineSelection<'_>, reverse: bool) -> String {
    let patch = if reverse {
        Patch::line_subset_reversed(path, selection)
    } else {
        Patch::line_subset(path, selection)
    };
    patch.map(|patch| patch.to_string()).unwrap_or_default()
}

/// Patch text for a character range. Empty for invalid requests.
#[must_use]
pub fn synthesize_char_range(path: &str, selection: &CharSelection<'_>) -> String {
    Patch::char_range(path, selection)
        .map(|patch| patch.to_string())
        .unwrap_or_default()
}

/// Patch text that reverts a whole hunk
#[must_use]
pub fn synthesize_reverse(path: &str, hunk: &Hunk) -> String {
    Patch::whole_hunk(path, hunk).reversed().to_string()
}

fn count(lines: &[PatchLine], side: fn(LineType) -> bool) -> u32 {
    lines.iter().filter(|line| side(line.kind)).count() as u32
}

/// Start of a side after its count changed from `before` to `after`.
///
/// An empty range `-N,0` names the line *after which* it sits, while a
/// non-empty range names its first line, so crossing zero shifts by one.
fn rebase_start(start: u32, before: u32, after: u32) -> u32 {
    match (before, after) {
        (0, 1..) => start.saturating_add(1),
        (1.., 0) => start.saturating_sub(1),
        _ => start,
    }
}

/// Old line number after which a line inserted at `index` would go
fn insertion_point(hunk: &Hunk, index: usize) -> u32 {
    if hunk.old_count == 0 {
        return hunk.old_start;
    }
    let before = hunk.lines[..index]
        .iter()
        .filter(|line| line.kind.in_old())
        .count() as u32;
    hunk.old_start.saturating_add(before).saturating_sub(1)
}
