//! Character-level diff between two versions of a line.
//!
//! The diff runs in stages:
//!
//! 1. Both strings are split into tokens (identifiers, numbers, operators,
//!    whitespace runs, single characters).
//! 2. A Myers diff over the token sequences gives a coarse edit script.
//!    Short equalities sandwiched between edits are merged into them so the
//!    result reads as a few coherent changes instead of many small ones.
//! 3. Every replaced region is diffed again character by character (with the
//!    same cleanup) to tighten its boundaries, so a one-letter change inside an
//!    identifier highlights one letter.
//! 4. All ranges are converted from byte offsets to rune offsets.
//!
//! ```
//! use git_hunks::chardiff::{CharChange, char_diff};
//!
//! let (old, new) = char_diff("let count = 1;", "let count = 2;");
//! assert_eq!(old, vec![CharChange { start: 12, end: 13, is_addition: false }]);
//! assert_eq!(new, vec![CharChange { start: 12, end: 13, is_addition: true }]);
//! ```

mod offset;
mod tokenize;

use offset::{ByteOffset, ByteSpan, RuneIndex};
use similar::{Algorithm, DiffOp, DiffTag, capture_diff_slices};
use tokenize::{Token, tokenize};

/// Inputs whose combined length exceeds this many bytes are not diffed.
pub const MAX_COMBINED_BYTES: usize = 10_000;

/// A changed range within one side of a line, in rune (codepoint) offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharChange {
    pub start: usize,
    pub end: usize,
    /// `true` for ranges in the new string, `false` for the old string
    pub is_addition: bool,
}

/// Tuning knobs for [`char_diff_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharDiffOptions {
    /// Lines longer than this (old + new, in bytes) get no highlighting
    pub max_combined_bytes: usize,
}

impl Default for CharDiffOptions {
    fn default() -> Self {
        Self {
            max_combined_bytes: MAX_COMBINED_BYTES,
        }
    }
}

/// Compute changed ranges on each side, using the default options.
///
/// Returns `(old_changes, new_changes)`; each list is sorted, non-overlapping
/// and in rune offsets relative to its own string.
#[must_use]
pub fn char_diff(old: &str, new: &str) -> (Vec<CharChange>, Vec<CharChange>) {
    char_diff_with(old, new, &CharDiffOptions::default())
}

/// [`char_diff`] with explicit options
#[must_use]
pub fn char_diff_with(
    old: &str,
    new: &str,
    options: &CharDiffOptions,
) -> (Vec<CharChange>, Vec<CharChange>) {
    if old == new {
        return (Vec::new(), Vec::new());
    }

    if old.len() + new.len() > options.max_combined_bytes {
        log::trace!(
            "skipping character diff of {} + {} bytes",
            old.len(),
            new.len()
        );
        return (Vec::new(), Vec::new());
    }

    if old.is_empty() {
        return (Vec::new(), vec![whole(new, true)]);
    }
    if new.is_empty() {
        return (vec![whole(old, false)], Vec::new());
    }

    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);

    let old_texts: Vec<&str> = old_tokens.iter().map(|t| t.text).collect();
    let new_texts: Vec<&str> = new_tokens.iter().map(|t| t.text).collect();
    let ops = capture_diff_slices(Algorithm::Myers, &old_texts, &new_texts);

    let chunks = cleanup_semantic(build_chunks(
        &ops,
        |k| token_start(&old_tokens, old.len(), k),
        |k| token_start(&new_tokens, new.len(), k),
    ));

    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();

    for chunk in chunks.iter().filter(|c| c.kind == ChunkKind::Change) {
        refine(old, new, chunk, &mut old_spans, &mut new_spans);
    }

    (
        to_changes(old, &old_spans, false),
        to_changes(new, &new_spans, true),
    )
}

/// Byte offset of the `k`-th token, or the string length past the last one
fn token_start(tokens: &[Token<'_>], len: usize, k: usize) -> ByteOffset {
    tokens.get(k).map_or(ByteOffset(len), |t| t.start)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKind {
    Equal,
    Change,
}

/// A stretch of the edit script. Change chunks may be empty on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    kind: ChunkKind,
    old: ByteSpan,
    new: ByteSpan,
}

/// Collapse diff ops into alternating equal/change chunks in byte space.
///
/// `old_at` and `new_at` map an element index of the diffed sequences to the
/// byte offset where that element starts.
fn build_chunks(
    ops: &[DiffOp],
    old_at: impl Fn(usize) -> ByteOffset,
    new_at: impl Fn(usize) -> ByteOffset,
) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    // The empty side of a delete or insert can carry a stale index, so each
    // chunk starts where the previous one ended.
    let (mut old_pos, mut new_pos) = (0, 0);

    for op in ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let kind = match tag {
            DiffTag::Equal => ChunkKind::Equal,
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => ChunkKind::Change,
        };
        let old = ByteSpan::new(old_at(old_pos), old_at(old_pos + old_range.len()));
        let new = ByteSpan::new(new_at(new_pos), new_at(new_pos + new_range.len()));
        old_pos += old_range.len();
        new_pos += new_range.len();

        match chunks.last_mut() {
            Some(last) if last.kind == kind => {
                last.old.end = old.end;
                last.new.end = new.end;
            }
            _ => chunks.push(Chunk { kind, old, new }),
        }
    }

    chunks
}

/// Absorb equalities that are no longer than the edits on both sides of
/// them, repeating until nothing changes.
fn cleanup_semantic(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    loop {
        let mut merged = false;
        let mut i = 1;

        while i + 1 < chunks.len() {
            let (prev, equal, next) = (chunks[i - 1], chunks[i], chunks[i + 1]);
            let absorbable = equal.kind == ChunkKind::Equal
                && prev.kind == ChunkKind::Change
                && next.kind == ChunkKind::Change
                && equal.old.len() <= prev.old.len().max(prev.new.len())
                && equal.old.len() <= next.old.len().max(next.new.len());

            if absorbable {
                let combined = Chunk {
                    kind: ChunkKind::Change,
                    old: ByteSpan::new(prev.old.start, equal.old.end.max(next.old.end)),
                    new: ByteSpan::new(prev.new.start, equal.new.end.max(next.new.end)),
                };
                chunks[i - 1] = combined;
                chunks.drain(i..=i + 1);
                merged = true;
            } else {
                i += 1;
            }
        }

        if !merged {
            return chunks;
        }
    }
}

/// Tighten one changed region with a character-level diff and record the
/// resulting byte ranges.
fn refine(
    old: &str,
    new: &str,
    chunk: &Chunk,
    old_spans: &mut Vec<ByteSpan>,
    new_spans: &mut Vec<ByteSpan>,
) {
    if chunk.old.is_empty() || chunk.new.is_empty() {
        push_span(old_spans, chunk.old);
        push_span(new_spans, chunk.new);
        return;
    }

    let old_part = chunk.old.slice(old);
    let new_part = chunk.new.slice(new);
    let old_chars: Vec<char> = old_part.chars().collect();
    let new_chars: Vec<char> = new_part.chars().collect();
    let old_index = RuneIndex::new(old_part);
    let new_index = RuneIndex::new(new_part);

    let ops = capture_diff_slices(Algorithm::Myers, &old_chars, &new_chars);
    let chunks = cleanup_semantic(build_chunks(
        &ops,
        |k| chunk.old.start.shifted(old_index.byte_at(k).0),
        |k| chunk.new.start.shifted(new_index.byte_at(k).0),
    ));

    for sub in chunks.iter().filter(|c| c.kind == ChunkKind::Change) {
        push_span(old_spans, sub.old);
        push_span(new_spans, sub.new);
    }
}

/// Append a span, merging it into the previous one when they touch
fn push_span(spans: &mut Vec<ByteSpan>, span: ByteSpan) {
    if span.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.end >= span.start => last.end = last.end.max(span.end),
        _ => spans.push(span),
    }
}

fn to_changes(text: &str, spans: &[ByteSpan], is_addition: bool) -> Vec<CharChange> {
    let index = RuneIndex::new(text);
    spans
        .iter()
        .map(|span| CharChange {
            start: index.rune_at(span.start),
            end: index.rune_at(span.end),
            is_addition,
        })
        .filter(|change| change.start < change.end)
        .collect()
}

fn whole(text: &str, is_addition: bool) -> CharChange {
    CharChange {
        start: 0,
        end: text.chars().count(),
        is_addition,
    }
}
