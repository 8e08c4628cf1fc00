pub mod file;
pub mod hunk;
pub mod parser;

pub use file::{FileDiff, FileStatus};
pub use hunk::{Hunk, HunkHeader, Line, LineType};
pub use parser::parse;

/// Format parsed diffs for display with explicit line numbers.
///
/// Every body line is shown with its index in the hunk line list (the index
/// used by selections), its old/new line numbers and its content.
///
/// Example output:
/// ```text
/// gtk.nix:
///   hunk 0 @@ -10,2 +10,3 @@
///     1 -10         :	    gtk.theme.name = "Adwaita";
///     2       +10   :	    # Theme managed by Stylix
/// ```
#[must_use]
pub fn format_diff(files: &[FileDiff]) -> String {
    let mut result = String::new();

    for file in files {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(file.path());
        result.push_str(":\n");

        if file.is_binary {
            result.push_str("  (binary)\n");
            continue;
        }

        for (h, hunk) in file.hunks.iter().enumerate() {
            result.push_str(&format!("  hunk {h} {}\n", hunk.header_text));

            for (i, line) in hunk.lines.iter().enumerate() {
                let numbers = match line.kind {
                    LineType::HunkHeader => continue,
                    LineType::Context => {
                        format!(" {:<5} {:<5}", line.old_line_number, line.new_line_number)
                    }
                    LineType::Removed => format!("-{:<5}      ", line.old_line_number),
                    LineType::Added => format!("      +{:<5}", line.new_line_number),
                };
                result.push_str(&format!("  {i:>3} {numbers}:\t{}\n", line.content));
            }
        }
    }

    result
}
