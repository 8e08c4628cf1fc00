use error_set::error_set;

pub mod chardiff;
pub mod correlate;
pub mod diff;
pub mod highlight;
pub mod parse;
pub mod patch;
pub mod status;

pub use chardiff::{CharChange, CharDiffOptions, char_diff, char_diff_with};
pub use correlate::{CorrelateOptions, correlate, correlate_with};
pub use diff::{FileDiff, FileStatus, Hunk, Line, LineType, format_diff};
pub use highlight::{HighlightOptions, HighlightedLine, highlight_hunk, highlight_hunk_with};
pub use parse::{ParseError, Selection, parse_selection};
pub use patch::{
    CharSelection, LineSelection, Patch, synthesize_char_range, synthesize_line_subset,
    synthesize_reverse, synthesize_whole_hunk,
};
pub use status::{DiffStat, FileEntry, parse_numstat, parse_status};

error_set! {
    /// Top-level error for git-hunks operations
    GitHunksError := {
        ParseError(ParseError),
    } || SelectError || InputError

    /// Errors from resolving a request against a parsed diff
    SelectError := {
        #[display("No diff found for {path}")]
        FileNotFound { path: String },
        #[display("No changes found in {path}")]
        NoChanges { path: String },
        #[display("{path} is a binary file")]
        BinaryFile { path: String },
        #[display("Hunk {index} out of range: {path} has {count} hunks")]
        HunkOutOfRange {
            path: String,
            index: usize,
            count: usize,
        },
    }

    /// Errors from reading diff input
    InputError := {
        #[display("Failed to read {source_name}: {message}")]
        ReadFailed { source_name: String, message: String },
        #[display("Invalid UTF-8 in {source_name}: {message}")]
        InvalidUtf8 { source_name: String, message: String },
    }
}

/// Main interface for selecting and staging parts of a parsed diff
#[derive(Debug, Clone, Default)]
pub struct HunkStager {
    files: Vec<FileDiff>,
    options: HighlightOptions,
}

impl HunkStager {
    /// Parse raw `git diff` output
    ///
    /// # Examples
    /// ```
    /// # use git_hunks::HunkStager;
    /// let stager = HunkStager::new(
    ///     "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-old\n+new\n",
    /// );
    /// assert_eq!(stager.files().len(), 1);
    ///
    /// let patch = stager.stage("a.txt", "0", false).unwrap();
    /// assert!(patch.ends_with("@@ -1 +1 @@\n-old\n+new\n"));
    /// ```
    #[must_use]
    pub fn new(diff_text: &str) -> Self {
        Self {
            files: diff::parse(diff_text),
            options: HighlightOptions::default(),
        }
    }

    /// Replace the highlighting options
    #[must_use]
    pub fn with_options(mut self, options: HighlightOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn files(&self) -> &[FileDiff] {
        &self.files
    }

    /// Diff formatted with selection indices and explicit line numbers
    #[must_use]
    pub fn show(&self) -> String {
        format_diff(&self.files)
    }

    /// Intra-line highlighting of every hunk in a file
    pub fn highlight(&self, path: &str) -> Result<Vec<Vec<HighlightedLine>>, SelectError> {
        Ok(self
            .file(path)?
            .hunks
            .iter()
            .map(|hunk| highlight_hunk_with(hunk, &self.options))
            .collect())
    }

    /// Patch for a selection string (see [`parse`] for the syntax)
    ///
    /// Returns an empty string when the selection changes nothing.
    ///
    /// # Examples
    /// ```
    /// # use git_hunks::HunkStager;
    /// let stager = HunkStager::new(
    ///     "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-old\n+new\n",
    /// );
    /// // Only the removal: the new side becomes empty
    /// let patch = stager.stage("a.txt", "0:1", false).unwrap();
    /// assert!(patch.ends_with("@@ -1 +0,0 @@\n-old\n"));
    /// ```
    pub fn stage(
        &self,
        path: &str,
        selection: &str,
        reverse: bool,
    ) -> Result<String, GitHunksError> {
        let selection = parse_selection(selection)?;
        Ok(self.patch_for(path, &selection, reverse)?)
    }

    /// Patch for an already parsed selection
    pub fn patch_for(
        &self,
        path: &str,
        selection: &Selection,
        reverse: bool,
    ) -> Result<String, SelectError> {
        let file = self.file(path)?;
        let hunk = self.hunk(file, selection.hunk())?;
        let path = file.path();

        let patch = match selection {
            Selection::Hunk(_) => {
                let patch = Patch::whole_hunk(path, hunk);
                Some(if reverse { patch.reversed() } else { patch })
            }
            // Unstaging works against the new side, which holds every line
            Selection::Lines { ranges, .. } if reverse => {
                Patch::line_subset_reversed(path, &LineSelection::from_ranges(hunk, ranges))
            }
            Selection::Lines { ranges, .. } => {
                Patch::line_subset(path, &LineSelection::from_ranges(hunk, ranges))
            }
            Selection::Chars {
                line, start, end, ..
            } => Patch::char_range(
                path,
                &CharSelection {
                    hunk,
                    line_index: *line,
                    char_start: *start,
                    char_end: *end,
                },
            )
            .map(|patch| if reverse { patch.reversed() } else { patch }),
        };

        match patch {
            Some(patch) => Ok(patch.to_string()),
            None => {
                log::info!("selection {selection:?} in {path} changes nothing");
                Ok(String::new())
            }
        }
    }

    /// Patch that reverts a whole hunk
    pub fn revert(&self, path: &str, hunk: usize) -> Result<String, SelectError> {
        let file = self.file(path)?;
        Ok(synthesize_reverse(file.path(), self.hunk(file, hunk)?))
    }

    fn file(&self, path: &str) -> Result<&FileDiff, SelectError> {
        let file = self
            .files
            .iter()
            .find(|file| file.path() == path || file.old_path == path)
            .ok_or_else(|| SelectError::FileNotFound {
                path: path.to_string(),
            })?;

        if file.is_binary {
            return Err(SelectError::BinaryFile {
                path: path.to_string(),
            });
        }

        Ok(file)
    }

    fn hunk<'a>(&self, file: &'a FileDiff, index: usize) -> Result<&'a Hunk, SelectError> {
        if file.hunks.is_empty() {
            return Err(SelectError::NoChanges {
                path: file.path().to_string(),
            });
        }

        file.hunks
            .get(index)
            .ok_or_else(|| SelectError::HunkOutOfRange {
                path: file.path().to_string(),
                index,
                count: file.hunks.len(),
            })
    }
}
