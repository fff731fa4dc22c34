use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Local-first notes with conflict-aware sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional JSON file with sync settings
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge two versions of a note and print the marked result
    Merge {
        /// Local (older) version
        old: PathBuf,
        /// Remote (newer) version
        new: PathBuf,
        /// Compare line by line instead of by markup tokens
        #[arg(long)]
        lines: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note content
        content: Vec<String>,
        /// Content kind, e.g. `plain`, `markdown`, `semantic-html;version=2`
        #[arg(long, default_value = "plain")]
        kind: String,
    },
    /// List recent notes
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a note
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Protect a note from deletion
    Lock {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Remove deletion protection from a note
    Unlock {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Delete an existing note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Apply a JSON array of change events to the local database
    Replay {
        /// Path to the events file
        events: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
