//! Parsers for `git status --porcelain=v2 -z` and `git diff --numstat`.
//!
//! Both are pure: callers run git and hand over its output.

use crate::diff::FileStatus;

/// One changed path from `git status`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    /// Source path of a rename or copy, empty otherwise
    pub old_path: String,
    /// Index status when it is set, worktree status otherwise
    pub status: FileStatus,
    /// Whether the index differs from HEAD for this path
    pub staged: bool,
    pub index_status: FileStatus,
    pub work_status: FileStatus,
}

/// Line counts for one path from `git diff --numstat`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffStat {
    pub path: String,
    pub added: u32,
    pub removed: u32,
}

/// Parse `git status --porcelain=v2 -z` output.
///
/// Header (`#`) records and malformed records are skipped.
#[must_use]
pub fn parse_status(output: &str) -> Vec<FileEntry> {
    let mut entries = Vec::new();
    let mut records = output.split('\0').filter(|record| !record.is_empty());

    while let Some(record) = records.next() {
        let entry = match record.split_at_checked(2) {
            Some(("1 ", _)) => ordinary(record),
            // The source path follows as its own NUL-terminated field
            Some(("2 ", _)) => match records.next() {
                Some(old_path) => renamed(record, old_path),
                None => None,
            },
            Some(("u ", _)) => unmerged(record),
            Some(("? ", path)) => Some(FileEntry {
                path: path.to_string(),
                status: FileStatus::Untracked,
                work_status: FileStatus::Untracked,
                ..FileEntry::default()
            }),
            Some(("! ", path)) => Some(FileEntry {
                path: path.to_string(),
                status: FileStatus::Ignored,
                work_status: FileStatus::Ignored,
                ..FileEntry::default()
            }),
            _ => None,
        };

        match entry {
            Some(entry) => entries.push(entry),
            None => log::debug!("skipping status record {record:?}"),
        }
    }

    entries
}

/// Split an `XY` field into index and worktree status
fn xy_status(xy: &str) -> Option<(FileStatus, FileStatus)> {
    let mut codes = xy.chars();
    let index = FileStatus::from_code(codes.next()?);
    let work = FileStatus::from_code(codes.next()?);
    Some((index, work))
}

/// `1 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <path>`
fn ordinary(record: &str) -> Option<FileEntry> {
    let fields: Vec<&str> = record.splitn(9, ' ').collect();
    let [_, xy, .., path] = fields.as_slice() else {
        return None;
    };
    if fields.len() < 9 {
        return None;
    }

    let (index_status, work_status) = xy_status(xy)?;
    let staged = index_status != FileStatus::Unmodified;

    Some(FileEntry {
        path: path.to_string(),
        old_path: String::new(),
        status: if staged { index_status } else { work_status },
        staged,
        index_status,
        work_status,
    })
}

/// `2 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <X><score> <path>`
fn renamed(record: &str, old_path: &str) -> Option<FileEntry> {
    let fields: Vec<&str> = record.splitn(10, ' ').collect();
    let [_, xy, .., path] = fields.as_slice() else {
        return None;
    };
    if fields.len() < 10 {
        return None;
    }

    let (index_status, work_status) = xy_status(xy)?;

    Some(FileEntry {
        path: path.to_string(),
        old_path: old_path.to_string(),
        status: FileStatus::Renamed,
        staged: index_status != FileStatus::Unmodified,
        index_status,
        work_status,
    })
}

/// `u <XY> <sub> <m1> <m2> <m3> <mW> <h1> <h2> <h3> <path>`
fn unmerged(record: &str) -> Option<FileEntry> {
    let fields: Vec<&str> = record.splitn(11, ' ').collect();
    if fields.len() < 11 {
        return None;
    }

    Some(FileEntry {
        path: fields[10].to_string(),
        old_path: String::new(),
        status: FileStatus::Unmerged,
        staged: false,
        index_status: FileStatus::Unmerged,
        work_status: FileStatus::Unmerged,
    })
}

/// Parse `git diff --numstat` output (`added\tremoved\tpath` per line).
///
/// Binary files report `-` for both counts and get zero.
#[must_use]
pub fn parse_numstat(output: &str) -> Vec<DiffStat> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, '\t');
            let added = count(fields.next()?)?;
            let removed = count(fields.next()?)?;
            let path = fields.next().filter(|path| !path.is_empty())?;

            Some(DiffStat {
                path: path.to_string(),
                added,
                removed,
            })
        })
        .collect()
}

fn count(field: &str) -> Option<u32> {
    match field {
        "-" => Some(0),
        digits => digits.parse().ok(),
    }
}
