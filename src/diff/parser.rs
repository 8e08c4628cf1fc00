//! Unified diff parser.
//!
//! Turns the text produced by `git diff` into [`FileDiff`] values. The parser
//! is total: malformed input yields a partial (or empty) result, never an
//! error.
//!
//! ```
//! use git_hunks::diff::parse;
//!
//! let files = parse(
//!     "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-old\n+new\n",
//! );
//! assert_eq!(files.len(), 1);
//! assert_eq!(files[0].hunks[0].lines.len(), 3);
//! ```

use super::file::FileDiff;
use super::hunk::{Hunk, Line, LineType};

/// Parse unified diff text into one [`FileDiff`] per `diff --git` header,
/// in encounter order.
#[must_use]
pub fn parse(text: &str) -> Vec<FileDiff> {
    let mut builder = DiffBuilder::default();

    // `split_terminator` keeps a trailing `\r` as content, so CRLF files
    // survive a parse/synthesize round trip.
    for (index, line) in text.split_terminator('\n').enumerate() {
        builder.feed(index + 1, line);
    }

    builder.finish()
}

/// Where the parser is within the diff stream.
#[derive(Debug, Default)]
enum State {
    /// Before the first `diff --git` line
    #[default]
    SeekingFileHeader,
    /// Inside a file's extended headers, no hunk open yet
    SeekingHunkHeader(FileDiff),
    /// Inside a hunk body
    InsideHunk {
        file: FileDiff,
        hunk: Hunk,
        old_line: u32,
        new_line: u32,
    },
}

/// Owned result list plus the in-progress file/hunk, flushed at every
/// boundary and once more at end of input.
#[derive(Debug, Default)]
struct DiffBuilder {
    files: Vec<FileDiff>,
    state: State,
}

impl DiffBuilder {
    fn feed(&mut self, number: usize, line: &str) {
        if let Some(file) = FileDiff::open(line) {
            self.flush();
            self.state = State::SeekingHunkHeader(file);
            return;
        }

        if is_binary_marker(line) {
            match &mut self.state {
                State::SeekingFileHeader => {}
                State::SeekingHunkHeader(file) | State::InsideHunk { file, .. } => {
                    file.is_binary = true;
                }
            }
            return;
        }

        if line.starts_with("@@ ")
            && !matches!(self.state, State::SeekingFileHeader)
            && let Some(hunk) = Hunk::open(line)
        {
            let file = match std::mem::take(&mut self.state) {
                State::SeekingHunkHeader(file) => file,
                State::InsideHunk {
                    mut file,
                    hunk: done,
                    ..
                } => {
                    file.hunks.push(done);
                    file
                }
                State::SeekingFileHeader => return,
            };

            self.state = State::InsideHunk {
                file,
                old_line: hunk.old_start,
                new_line: hunk.new_start,
                hunk,
            };
            return;
        }

        if let State::InsideHunk {
            hunk,
            old_line,
            new_line,
            ..
        } = &mut self.state
        {
            push_body_line(hunk, old_line, new_line, number, line);
        }
    }

    /// Move the in-progress file (and its open hunk) into the result list
    fn flush(&mut self) {
        match std::mem::take(&mut self.state) {
            State::SeekingFileHeader => {}
            State::SeekingHunkHeader(file) => self.files.push(file),
            State::InsideHunk { mut file, hunk, .. } => {
                file.hunks.push(hunk);
                self.files.push(file);
            }
        }
    }

    fn finish(mut self) -> Vec<FileDiff> {
        self.flush();
        self.files
    }
}

fn is_binary_marker(line: &str) -> bool {
    line.starts_with("Binary files ") && line.ends_with(" differ")
}

fn push_body_line(hunk: &mut Hunk, old_line: &mut u32, new_line: &mut u32, number: usize, line: &str) {
    let (kind, content) = match line.as_bytes().first() {
        // An empty line is tolerated as an empty context line
        None => (LineType::Context, ""),
        Some(b' ') => (LineType::Context, &line[1..]),
        Some(b'+') => (LineType::Added, &line[1..]),
        Some(b'-') => (LineType::Removed, &line[1..]),
        Some(b'\\') => {
            if let Some(last) = hunk.lines.last_mut()
                && last.kind != LineType::HunkHeader
            {
                last.no_newline = true;
            }
            return;
        }
        Some(_) => {
            log::debug!("skipping unrecognized diff line {number}: {line:?}");
            return;
        }
    };

    let parsed = match kind {
        LineType::Added => Line::added(content, *new_line),
        LineType::Removed => Line::removed(content, *old_line),
        _ => Line::context(content, *old_line, *new_line),
    };

    if kind.in_old() {
        *old_line = old_line.saturating_add(1);
    }
    if kind.in_new() {
        *new_line = new_line.saturating_add(1);
    }

    hunk.lines.push(parsed);
}
