use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "diffparse", about = "Parse unified diffs into files, hunks and lines")]
pub struct Cli {
    /// Diff file to read. Reads stdin when absent or "-".
    #[arg(conflicts_with = "git")]
    pub input: Option<PathBuf>,

    /// Parse the output of `git diff <RANGE>` instead (e.g., "main..HEAD").
    #[arg(long, value_name = "RANGE")]
    pub git: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one line per file plus totals (default).
    Summary,
    /// Print the added line numbers of each file.
    Changed,
    /// Print the full parsed model as JSON.
    Dump,
    /// Print the diff back out as normalized unified text.
    Render,
    /// Store the diff in a database and print its id.
    Save(SaveArgs),
    /// Print the summary of a stored diff.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Database file, created if missing.
    #[arg(long)]
    pub db: PathBuf,
    /// Pull request number to associate the diff with.
    #[arg(long)]
    pub pull: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Database file.
    #[arg(long)]
    pub db: PathBuf,
    /// Id printed by `save`.
    pub id: i64,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
