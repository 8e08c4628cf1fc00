use clap::{Args, Parser, Subcommand};
use git_hunks::{
    CharDiffOptions, CorrelateOptions, GitHunksError, HighlightOptions, HunkStager, InputError,
    LineType,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "git-hunks")]
#[command(about = "Select, highlight and stage parts of git diff hunks")]
#[command(version)]
struct Cli {
    /// Read the diff from this file instead of stdin
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    #[command(flatten)]
    tuning: Tuning,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Tuning {
    /// Equal-sized change runs more similar than this are paired line by line
    #[arg(long, global = true, default_value_t = git_hunks::correlate::POSITIONAL_THRESHOLD)]
    positional_threshold: f64,

    /// Minimum similarity for pairing a removed line with an added line
    #[arg(long, global = true, default_value_t = git_hunks::correlate::MATCH_THRESHOLD)]
    match_threshold: f64,

    /// Line pairs longer than this many bytes are not highlighted
    #[arg(long, global = true, default_value_t = git_hunks::chardiff::MAX_COMBINED_BYTES)]
    max_line_bytes: usize,
}

impl From<&Tuning> for HighlightOptions {
    fn from(tuning: &Tuning) -> Self {
        HighlightOptions {
            correlate: CorrelateOptions {
                positional_threshold: tuning.positional_threshold,
                match_threshold: tuning.match_threshold,
            },
            char_diff: CharDiffOptions {
                max_combined_bytes: tuning.max_line_bytes,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List files and hunks with line indices and old/new line numbers
    Show,
    /// Show intra-line changes (in character offsets) for a file
    Highlight {
        /// Path of the file in the diff
        file: String,
    },
    /// Print a patch for `git apply --cached --unidiff-zero -`
    Stage {
        /// Path of the file in the diff
        file: String,
        /// Hunk selection: "H", "H:I,J,K..L" or "H:I@S..E"
        selection: String,
        /// Print the reverse patch, for unstaging
        #[arg(long)]
        reverse: bool,
    },
    /// Print a patch that reverts a whole hunk
    Revert {
        /// Path of the file in the diff
        file: String,
        /// Hunk index
        hunk: usize,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, GitHunksError> {
    let stager = HunkStager::new(&read_input(cli.input.as_deref())?)
        .with_options(HighlightOptions::from(&cli.tuning));

    Ok(match cli.command {
        Commands::Show => stager.show(),
        Commands::Highlight { file } => format_highlight(&stager, &file)?,
        Commands::Stage {
            file,
            selection,
            reverse,
        } => stager.stage(&file, &selection, reverse)?,
        Commands::Revert { file, hunk } => stager.revert(&file, hunk)?,
    })
}

fn read_input(path: Option<&Path>) -> Result<String, InputError> {
    let (source_name, bytes) = match path {
        Some(path) => (
            path.display().to_string(),
            std::fs::read(path).map_err(|e| InputError::ReadFailed {
                source_name: path.display().to_string(),
                message: e.to_string(),
            })?,
        ),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|e| InputError::ReadFailed {
                    source_name: "stdin".to_string(),
                    message: e.to_string(),
                })?;
            ("stdin".to_string(), bytes)
        }
    };

    String::from_utf8(bytes).map_err(|e| InputError::InvalidUtf8 {
        source_name,
        message: e.to_string(),
    })
}

fn format_highlight(stager: &HunkStager, file: &str) -> Result<String, GitHunksError> {
    let mut result = String::new();

    for (h, hunk) in stager.highlight(file)?.iter().enumerate() {
        for (i, highlighted) in hunk.iter().enumerate() {
            let line = &highlighted.line;
            let Some(prefix) = line.kind.prefix() else {
                result.push_str(&format!("hunk {h} {}\n", line.content));
                continue;
            };
            result.push_str(&format!("  {i:>3} {prefix}{}\n", line.content));

            if !highlighted.changes.is_empty() && line.kind != LineType::Context {
                let ranges: Vec<String> = highlighted
                    .changes
                    .iter()
                    .map(|c| format!("{}..{}", c.start, c.end))
                    .collect();
                result.push_str(&format!("        ^ {}\n", ranges.join(", ")));
            }
        }
    }

    Ok(result)
}
