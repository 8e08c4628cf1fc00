use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{map_res, opt},
    sequence::preceded,
};
use std::fmt;

/// Classification of a single line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineType {
    Context,
    Added,
    Removed,
    HunkHeader,
}

impl LineType {
    /// Prefix used for this line in unified-diff text, if it has one
    #[must_use]
    pub fn prefix(self) -> Option<char> {
        match self {
            LineType::Context => Some(' '),
            LineType::Added => Some('+'),
            LineType::Removed => Some('-'),
            LineType::HunkHeader => None,
        }
    }

    /// Whether the line exists in the old version of the file
    #[must_use]
    pub fn in_old(self) -> bool {
        matches!(self, LineType::Context | LineType::Removed)
    }

    /// Whether the line exists in the new version of the file
    #[must_use]
    pub fn in_new(self) -> bool {
        matches!(self, LineType::Context | LineType::Added)
    }

    #[must_use]
    pub fn is_change(self) -> bool {
        matches!(self, LineType::Added | LineType::Removed)
    }

    /// The same line seen from the other side of the diff
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            LineType::Added => LineType::Removed,
            LineType::Removed => LineType::Added,
            other => other,
        }
    }
}

/// A single line of a hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineType,
    /// Line text without the prefix character or trailing newline
    pub content: String,
    /// Line number in the old file, 0 if the line is not present there
    pub old_line_number: u32,
    /// Line number in the new file, 0 if the line is not present there
    pub new_line_number: u32,
    /// Followed by a `\ No newline at end of file` marker
    pub no_newline: bool,
}

impl Line {
    pub fn context(content: impl Into<String>, old: u32, new: u32) -> Self {
        Self::with_numbers(LineType::Context, content, old, new)
    }

    pub fn added(content: impl Into<String>, new: u32) -> Self {
        Self::with_numbers(LineType::Added, content, 0, new)
    }

    pub fn removed(content: impl Into<String>, old: u32) -> Self {
        Self::with_numbers(LineType::Removed, content, old, 0)
    }

    pub fn header(text: impl Into<String>) -> Self {
        Self::with_numbers(LineType::HunkHeader, text, 0, 0)
    }

    fn with_numbers(kind: LineType, content: impl Into<String>, old: u32, new: u32) -> Self {
        Line {
            kind,
            content: content.into(),
            old_line_number: old,
            new_line_number: new,
            no_newline: false,
        }
    }
}

/// A single hunk from a unified diff
///
/// `lines` starts with the [`LineType::HunkHeader`] line produced by the
/// parser, so indices used for selections address this full list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// The complete `@@ ... @@` header line as it appeared in the diff
    pub header_text: String,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Open a hunk from its header line, with only the header line in `lines`.
    ///
    /// Returns `None` if `header` is not a hunk header.
    #[must_use]
    pub fn open(header: &str) -> Option<Self> {
        let parsed = HunkHeader::parse(header)?;
        Some(Hunk {
            old_start: parsed.old_start,
            old_count: parsed.old_count,
            new_start: parsed.new_start,
            new_count: parsed.new_count,
            header_text: header.to_string(),
            lines: vec![Line::header(header)],
        })
    }

    /// Build a hunk from body lines, numbering them from the given starts
    /// and deriving the counts and header text.
    pub fn from_body<'a>(
        old_start: u32,
        new_start: u32,
        body: impl IntoIterator<Item = (LineType, &'a str)>,
    ) -> Self {
        let mut old_count: u32 = 0;
        let mut new_count: u32 = 0;
        let mut lines = Vec::new();

        for (kind, content) in body {
            let old = old_start.saturating_add(old_count);
            let new = new_start.saturating_add(new_count);
            let line = match kind {
                LineType::Context => Line::context(content, old, new),
                LineType::Added => Line::added(content, new),
                LineType::Removed => Line::removed(content, old),
                LineType::HunkHeader => continue,
            };
            if kind.in_old() {
                old_count = old_count.saturating_add(1);
            }
            if kind.in_new() {
                new_count = new_count.saturating_add(1);
            }
            lines.push(line);
        }

        let header_text = HunkHeader {
            old_start,
            old_count,
            new_start,
            new_count,
            section: "",
        }
        .to_string();

        lines.insert(0, Line::header(header_text.as_str()));

        Hunk {
            old_start,
            old_count,
            new_start,
            new_count,
            header_text,
            lines,
        }
    }

    /// Trailing text after the closing `@@` of the header (usually the
    /// enclosing function), including its leading space
    #[must_use]
    pub fn section(&self) -> &str {
        HunkHeader::parse(&self.header_text)
            .map(|h| h.section)
            .unwrap_or("")
    }

    /// Whether the hunk contains at least one added or removed line
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|line| line.kind.is_change())
    }

    /// Iterate over body lines, skipping the header line
    pub fn body(&self) -> impl Iterator<Item = &Line> {
        self.lines
            .iter()
            .filter(|line| line.kind != LineType::HunkHeader)
    }

    /// The hunk as it appears in the diff from new to old.
    ///
    /// Line indices are unchanged, so selections made against `self` can be
    /// applied to the result.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let header_text = HunkHeader {
            old_start: self.new_start,
            old_count: self.new_count,
            new_start: self.old_start,
            new_count: self.old_count,
            section: self.section(),
        }
        .to_string();

        let lines = self
            .lines
            .iter()
            .map(|line| match line.kind {
                LineType::HunkHeader => Line::header(header_text.as_str()),
                kind => Line {
                    kind: kind.reversed(),
                    content: line.content.clone(),
                    old_line_number: line.new_line_number,
                    new_line_number: line.old_line_number,
                    no_newline: line.no_newline,
                },
            })
            .collect();

        Hunk {
            old_start: self.new_start,
            old_count: self.new_count,
            new_start: self.old_start,
            new_count: self.old_count,
            header_text,
            lines,
        }
    }

    /// Whether the header counts agree with the body lines
    #[must_use]
    pub fn counts_match(&self) -> bool {
        let old = self.body().filter(|l| l.kind.in_old()).count();
        let new = self.body().filter(|l| l.kind.in_new()).count();
        old == self.old_count as usize && new == self.new_count as usize
    }
}

/// Parsed form of an `@@ -a,b +c,d @@section` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader<'a> {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub section: &'a str,
}

impl<'a> HunkHeader<'a> {
    /// Parse a hunk header. Omitted counts default to 1.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        header(line).ok().map(|(_, parsed)| parsed)
    }
}

impl fmt::Display for HunkHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ {} {} @@{}",
            format_range('-', self.old_start, self.old_count),
            format_range('+', self.new_start, self.new_count),
            self.section
        )
    }
}

/// Format one side of a hunk header the way git does: the count is
/// omitted when it is exactly 1.
pub(crate) fn format_range(sign: char, start: u32, count: u32) -> String {
    match count {
        1 => format!("{sign}{start}"),
        n => format!("{sign}{start},{n}"),
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

fn range(input: &str) -> IResult<&str, (u32, u32)> {
    let (input, (start, count)) = (number, opt(preceded(char(','), number))).parse(input)?;
    Ok((input, (start, count.unwrap_or(1))))
}

fn header(input: &str) -> IResult<&str, HunkHeader<'_>> {
    let (section, (_, (old_start, old_count), _, (new_start, new_count), _)) =
        (tag("@@ -"), range, tag(" +"), range, tag(" @@")).parse(input)?;

    Ok((
        "",
        HunkHeader {
            old_start,
            old_count,
            new_start,
            new_count,
            section,
        },
    ))
}
