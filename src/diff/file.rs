use super::hunk::Hunk;
use std::fmt;

/// Status of a file as reported by git
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileStatus {
    #[default]
    Unmodified,
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Ignored,
    Unmerged,
}

impl FileStatus {
    /// Single-character code, as used by `git status`
    #[must_use]
    pub fn code(self) -> char {
        match self {
            FileStatus::Unmodified => ' ',
            FileStatus::Modified => 'M',
            FileStatus::Added => 'A',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::Untracked => '?',
            FileStatus::Ignored => '!',
            FileStatus::Unmerged => 'U',
        }
    }

    /// Inverse of [`FileStatus::code`]. Unknown codes (including `.`) map to
    /// [`FileStatus::Unmodified`].
    #[must_use]
    pub fn from_code(code: char) -> Self {
        match code {
            'M' => FileStatus::Modified,
            'A' => FileStatus::Added,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'C' => FileStatus::Copied,
            'U' => FileStatus::Unmerged,
            '?' => FileStatus::Untracked,
            '!' => FileStatus::Ignored,
            _ => FileStatus::Unmodified,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The diff of a single file.
///
/// Binary files carry no hunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Path from the `a/` side of the `diff --git` header
    pub old_path: String,
    /// Path from the `b/` side of the `diff --git` header
    pub new_path: String,
    pub hunks: Vec<Hunk>,
    pub is_binary: bool,
}

impl FileDiff {
    /// Start a file from a `diff --git a/<old> b/<new>` header line.
    ///
    /// Returns `None` if `line` is not a file header.
    #[must_use]
    pub fn open(line: &str) -> Option<Self> {
        let paths = line.strip_prefix("diff --git a/")?;
        let (old_path, new_path) = paths.rsplit_once(" b/")?;

        Some(FileDiff {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
            ..FileDiff::default()
        })
    }

    /// Path used to address this file in patches
    #[must_use]
    pub fn path(&self) -> &str {
        if self.new_path.is_empty() {
            &self.old_path
        } else {
            &self.new_path
        }
    }
}
