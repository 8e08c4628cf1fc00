//! Parsing for the hunk selection syntax used by the command line.
//!
//! # Syntax
//!
//! - `H` - the whole hunk `H` (0-based index into the file's hunks)
//! - `H:I,J,K..L` - lines `I`, `J` and `K` through `L` (inclusive) of hunk `H`,
//!   indexed into the hunk's line list where index 0 is the `@@` header.
//!   Ranges are kept as written and only resolved against a hunk.
//! - `H:I@S..E` - characters `[S, E)` of line `I` of hunk `H`, counted in
//!   Unicode scalar values. `S >= E` selects nothing.
//!
//! # Examples
//!
//! ```
//! use git_hunks::parse::{parse_selection, Selection};
//!
//! assert_eq!(parse_selection("2").unwrap(), Selection::Hunk(2));
//!
//! let selection = parse_selection("0:1,3..4").unwrap();
//! assert_eq!(
//!     selection,
//!     Selection::Lines { hunk: 0, ranges: vec![1..=1, 3..=4] }
//! );
//!
//! let selection = parse_selection("1:2@6..12").unwrap();
//! assert_eq!(
//!     selection,
//!     Selection::Chars { hunk: 1, line: 2, start: 6, end: 12 }
//! );
//! ```

use error_set::error_set;
use std::ops::RangeInclusive;

error_set! {
    /// Errors from parsing selection syntax
    ParseError := {
        /// Input is empty or has more than one `:` separator
        #[display("Invalid selection '{input}': expected 'H', 'H:I,J,K..L' or 'H:I@S..E'")]
        InvalidFormat { input: String },
        /// Hunk index before the colon is empty or whitespace
        #[display("Invalid selection '{input}': hunk index cannot be empty")]
        EmptyHunk { input: String },
        /// No line indices provided after the colon
        #[display("No line indices provided")]
        EmptyRefs,
        /// Index could not be parsed as a non-negative integer
        #[display("Invalid index '{value}'")]
        InvalidNumber { value: String },
        /// Line range has start greater than end
        #[display("Invalid range {start}..{end}: start must be <= end")]
        InvalidRange { start: usize, end: usize },
        /// Character range is missing `..`
        #[display("Invalid character range '{value}': expected 'S..E'")]
        InvalidCharRange { value: String },
    }
}

/// What part of a file's diff to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A whole hunk
    Hunk(usize),
    /// Inclusive ranges of line indices within a hunk
    Lines {
        hunk: usize,
        ranges: Vec<RangeInclusive<usize>>,
    },
    /// A character range `[start, end)` within one line of a hunk
    Chars {
        hunk: usize,
        line: usize,
        start: usize,
        end: usize,
    },
}

impl Selection {
    /// Index of the hunk this selection refers to
    #[must_use]
    pub fn hunk(&self) -> usize {
        match self {
            Selection::Hunk(hunk)
            | Selection::Lines { hunk, .. }
            | Selection::Chars { hunk, .. } => *hunk,
        }
    }
}

/// Parse a selection string into structured data.
///
/// # Errors
///
/// Returns [`ParseError`] if:
/// - Input is empty or contains more than one `:`
/// - Hunk index is empty or not a number
/// - No line indices are provided after `:`
/// - A line range is inverted
/// - A character range has no `..`
pub fn parse_selection(input: &str) -> Result<Selection, ParseError> {
    let (hunk, refs) = match input.split_once(':') {
        Some((hunk, refs)) if !refs.contains(':') => (hunk, Some(refs)),
        Some(_) => {
            return Err(ParseError::InvalidFormat {
                input: input.to_string(),
            });
        }
        None => (input, None),
    };

    let hunk = hunk.trim();
    if hunk.is_empty() {
        return Err(match refs {
            Some(_) => ParseError::EmptyHunk {
                input: input.to_string(),
            },
            None => ParseError::InvalidFormat {
                input: input.to_string(),
            },
        });
    }
    let hunk = parse_number(hunk)?;

    let Some(refs) = refs.map(str::trim) else {
        return Ok(Selection::Hunk(hunk));
    };

    if let Some((line, range)) = refs.split_once('@') {
        let (start, end) = parse_char_range(range.trim())?;
        return Ok(Selection::Chars {
            hunk,
            line: parse_number(line.trim())?,
            start,
            end,
        });
    }

    Ok(Selection::Lines {
        hunk,
        ranges: parse_line_refs(refs)?,
    })
}

/// Parse the line indices part (after the colon)
/// Examples: "3", "1..4", "1,3,5..6"
fn parse_line_refs(input: &str) -> Result<Vec<RangeInclusive<usize>>, ParseError> {
    let mut ranges = Vec::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once("..") {
            Some((start, end)) => {
                let start = parse_number(start)?;
                let end = parse_number(end)?;
                if start > end {
                    return Err(ParseError::InvalidRange { start, end });
                }
                ranges.push(start..=end);
            }
            None => {
                let index = parse_number(part)?;
                ranges.push(index..=index);
            }
        }
    }

    if ranges.is_empty() {
        return Err(ParseError::EmptyRefs);
    }

    Ok(ranges)
}

/// Parse `S..E`. Empty and inverted ranges are left for the patch builder.
fn parse_char_range(input: &str) -> Result<(usize, usize), ParseError> {
    let (start, end) = input
        .split_once("..")
        .ok_or_else(|| ParseError::InvalidCharRange {
            value: input.to_string(),
        })?;

    Ok((parse_number(start)?, parse_number(end)?))
}

fn parse_number(input: &str) -> Result<usize, ParseError> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidNumber {
            value: input.to_string(),
        })
}
